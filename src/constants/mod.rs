use std::str::FromStr;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("{0} must be set in .env file or environment variable")]
    Missing(&'static str),
    #[error("{key} must be a valid {kind}, got '{value}'")]
    Invalid { key: &'static str, kind: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Env {
    pub jwt_secret: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub workers: usize,
    pub upload_root: String,
    pub upload_max_file_size: usize,
    pub upload_max_files: usize,
}

impl Env {
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(EnvError::Missing("SECRET_KEY"))?;

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        let ip = lookup("IP").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse(&lookup, "PORT", "u16 integer", 8080)?;
        let workers = parse(&lookup, "WORKERS", "usize integer", 2)?;

        let upload_root = lookup("UPLOAD_ROOT")
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "uploads".to_string());
        let upload_max_file_size =
            parse(&lookup, "UPLOAD_MAX_FILE_SIZE", "usize integer", 5 * 1024 * 1024)?;
        let upload_max_files = parse(&lookup, "UPLOAD_MAX_FILES", "usize integer", 10)?;

        Ok(Env {
            jwt_secret,
            frontend_url,
            ip,
            port,
            workers,
            upload_root,
            upload_max_file_size,
            upload_max_files,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, kind: &'static str, default: T) -> Result<T, EnvError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => {
            value.trim().parse::<T>().map_err(|_| EnvError::Invalid { key, kind, value })
        }
        None => Ok(default),
    }
}
