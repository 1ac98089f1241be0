use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use hocon::{Hocon, HoconLoader};

const ENV_PREFIX: &str = "VOTECHESS_";

/// Reads typed options out of a HOCON file.
///
/// Keys are looked up in the environment first (`VOTECHESS_<KEY>`), then inside the configured scope, then at
/// the root of the document. Relative paths are resolved against the directory of the config file.
#[derive(Debug)]
pub struct ConfigLoader {
    hocon: Hocon,
    env: HashMap<String, String>,
    scope: String,
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, scope: String) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("The config file {:?} was not found", path));
        }

        let hocon = HoconLoader::new()
            .load_file(path)
            .with_context(|| format!("Failed to find or load config file at: {:?}", path))?
            .hocon()
            .with_context(|| format!("Failed to parse config file at: {:?}", path))?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            hocon,
            env: env_overrides(),
            scope,
            base_dir,
        })
    }

    pub fn from_str(contents: &str, scope: String) -> Result<Self> {
        let hocon = HoconLoader::new()
            .load_str(contents)
            .context("Failed to load config string")?
            .hocon()
            .context("Failed to parse config string")?;

        Ok(Self {
            hocon,
            env: HashMap::new(),
            scope,
            base_dir: PathBuf::from("."),
        })
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.env.get(&name.to_uppercase()) {
            return Some(Value::String(value.clone()));
        }

        let scope = &self.hocon[self.scope.as_str()];
        if matches!(scope, Hocon::Hash(_)) {
            if let Some(value) = Self::map_hocon(scope, name) {
                return Some(value);
            }
        }

        Self::map_hocon(&self.hocon, name)
    }

    /// Resolves a path valued key relative to the directory holding the config file.
    pub fn get_relative_path(&self, name: &str) -> Option<PathBuf> {
        self.get(name)
            .and_then(|v| v.as_string())
            .map(|p| self.base_dir.join(p))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn load<T: Config>(&self) -> Result<T> {
        let res = T::load(self)?;
        Ok(res)
    }

    fn map_hocon(hocon: &Hocon, name: &str) -> Option<Value> {
        match &hocon[name] {
            Hocon::Real(f64) => Some(Value::Float(*f64 as f32)),
            Hocon::Integer(i64) => Some(Value::Integer(*i64)),
            Hocon::String(string) => Some(Value::String(string.clone())),
            Hocon::Boolean(bool) => Some(Value::Boolean(*bool)),
            _ => None,
        }
    }
}

fn env_overrides() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|k| (k.to_string(), v)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f32),
    Boolean(bool),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(val) => Some(*val),
            Value::String(val) => Hocon::String(val.clone()).as_bool(),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Integer(val) => u32::try_from(*val).ok(),
            Value::String(val) => val.parse::<u32>().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(val) => u64::try_from(*val).ok(),
            Value::String(val) => val.parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(val) => i32::try_from(*val).ok(),
            Value::String(val) => val.parse::<i32>().ok(),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Integer(val) => usize::try_from(*val).ok(),
            Value::String(val) => val.parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Integer(val) => Some(*val as f32),
            Value::String(val) => val.parse::<f32>().ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(val) => Some(val.clone()),
            Value::Boolean(true) => Some("true".to_string()),
            Value::Boolean(false) => Some("false".to_string()),
            Value::Float(val) => Some(val.to_string()),
            Value::Integer(val) => Some(val.to_string()),
        }
    }
}

pub trait Config {
    fn load(config: &ConfigLoader) -> Result<Self>
    where
        Self: Sized;
}
