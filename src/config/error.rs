use std::error::Error;
use std::fmt;
use std::path::PathBuf;


#[derive(Debug)]
#[non_exhaustive]
pub struct ConfigError {
    pub kind: ConfigErrorKind
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind) -> Self {
        ConfigError { kind }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigError: {}", self.kind)
    }
}

impl Error for ConfigError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum ConfigErrorKind {
    Io { path: PathBuf, source: std::io::Error },
    MissingDatabaseUrl(String),
    NoEnvironments,
    NotFound(PathBuf),
    UnexpandedVariable(String),
    UnknownEnvironment { name: String, available: Vec<String> },
    UnsetVariable { env: String, var: String },
    Yaml { path: PathBuf, source: serde_yaml::Error },
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "Failed to read config file: '{path:?}'"),
            Self::MissingDatabaseUrl(env) => write!(f, "environments.{env}.database_url is required"),
            Self::NoEnvironments => write!(f, "environments must have at least 1 item"),
            Self::NotFound(path) => write!(f, "No config file found (looking for '{}')", path.display()),
            Self::UnexpandedVariable(env) => write!(f, "Environment '{env}': database_url contains unexpanded variable"),
            Self::UnknownEnvironment { name, available } => {
                write!(f, "Environment '{name}' not found (available: {})", available.join(", "))
            },
            Self::UnsetVariable { env, var } => write!(f, "Environment '{env}': database_url references unset env var '{var}'"),
            Self::Yaml { path, source } => write!(f, "Invalid config file '{}': {source}", path.display()),
        }
    }
}

impl Error for ConfigErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Io { source, .. } => Some(source),
			Self::Yaml { source, .. } => Some(source),
			_ => None,
		}
	}
}
