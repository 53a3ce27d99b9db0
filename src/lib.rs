//! va-config
//!
//! Punto de entrada operativo de la capa de persistencia:
//! - `cli`: comandos `init` / `verify` del binario `va-db`.
//! - `logging`: subscriber de `tracing` que recoge los registros `log` de
//!   las librerías.

pub mod cli;
pub mod logging;
