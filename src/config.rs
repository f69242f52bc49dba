//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! `AppConfig::run_options` traduce la configuración a las opciones del engine.
use std::env;
use std::fmt;
use std::str::FromStr;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;
use pipeflow_core::{BindingPrecedence, RunOptions};

use crate::errors::AppError;

pub const ALLOW_ASYNC_ARGS: &str = "PIPEFLOW_ALLOW_ASYNC_ARGS";
pub const BINDING_PRECEDENCE: &str = "PIPEFLOW_BINDING_PRECEDENCE";
pub const LOG_LEVEL: &str = "PIPEFLOW_LOG_LEVEL";
pub const REPORT_FORMAT: &str = "PIPEFLOW_REPORT_FORMAT";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Formato del reporte que imprime el binario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(AppError::Config(format!("{REPORT_FORMAT}: formato desconocido '{other}'"))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        ReportFormat::Text => "text",
                        ReportFormat::Json => "json",
                    })
    }
}

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Esperar diferidos al resolver argumentos.
    pub allow_async_args: bool,
    pub precedence: BindingPrecedence,
    /// Nivel por defecto para `env_logger` (`RUST_LOG` tiene prioridad).
    pub log_level: String,
    pub report_format: ReportFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { allow_async_args: false,
               precedence: BindingPrecedence::default(),
               log_level: "info".to_string(),
               report_format: ReportFormat::default() }
    }
}

impl AppConfig {
    /// Lee la configuración del entorno (previa carga de `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let allow_async_args = match lookup(ALLOW_ASYNC_ARGS) {
            Some(raw) => parse_bool(ALLOW_ASYNC_ARGS, &raw)?,
            None => defaults.allow_async_args,
        };
        let precedence = match lookup(BINDING_PRECEDENCE) {
            Some(raw) => raw.parse::<BindingPrecedence>()
                            .map_err(|e| AppError::Config(format!("{BINDING_PRECEDENCE}: {e}")))?,
            None => defaults.precedence,
        };
        let log_level = lookup(LOG_LEVEL).map(|v| v.trim().to_ascii_lowercase())
                                         .filter(|v| !v.is_empty())
                                         .unwrap_or(defaults.log_level);
        let report_format = match lookup(REPORT_FORMAT) {
            Some(raw) => raw.parse()?,
            None => defaults.report_format,
        };
        Ok(Self { allow_async_args,
                  precedence,
                  log_level,
                  report_format })
    }

    /// Opciones de run derivadas de la configuración.
    pub fn run_options(&self) -> RunOptions {
        RunOptions::new().with_async_args(self.allow_async_args)
                         .with_precedence(self.precedence)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::Config(format!("{key}: se esperaba un booleano, no '{other}'"))),
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
/// Si el entorno es inválido se registra un aviso y se usan los valores
/// por defecto.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::from_env().unwrap_or_else(|e| {
                              warn!("{e}; usando configuración por defecto");
                              AppConfig::default()
                          })
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(!cfg.run_options().allow_async_args);
        assert_eq!(cfg.run_options().precedence, BindingPrecedence::StepBindingsWin);
    }

    #[test]
    fn reads_every_key() {
        let cfg = AppConfig::from_lookup(lookup(&[(ALLOW_ASYNC_ARGS, "yes"),
                                                  (BINDING_PRECEDENCE, "args"),
                                                  (LOG_LEVEL, "DEBUG"),
                                                  (REPORT_FORMAT, "json")])).unwrap();
        assert!(cfg.allow_async_args);
        assert_eq!(cfg.precedence, BindingPrecedence::ArgsWin);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.report_format, ReportFormat::Json);

        let opts = cfg.run_options();
        assert!(opts.allow_async_args);
        assert_eq!(opts.precedence, BindingPrecedence::ArgsWin);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = AppConfig::from_lookup(lookup(&[(ALLOW_ASYNC_ARGS, "maybe")])).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains(ALLOW_ASYNC_ARGS)));

        let err = AppConfig::from_lookup(lookup(&[(BINDING_PRECEDENCE, "random")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = AppConfig::from_lookup(lookup(&[(REPORT_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
