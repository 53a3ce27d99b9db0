//! Configuración de logging del binario `va-db`.
//!
//! Las librerías del workspace emiten por la fachada `log`; el subscriber de
//! `tracing` recoge esos registros (puente `tracing-log`) y los escribe en
//! stderr, dejando stdout para la salida de los comandos.
//!
//! Nivel controlado por `VA_LOG` (sintaxis `EnvFilter`):
//! - `VA_LOG=debug` muestra cada operación de los stores
//! - `VA_LOG=info` (por defecto) muestra los pasos de aprovisionamiento
//! - `VA_LOG=va_persistence::sql=info,warn` sólo el eco de sentencias

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "VA_LOG";

pub fn init() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(env_filter)
                                  .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                                  .try_init()?;
    tracing::debug!("logging initialized");
    Ok(())
}
