pub mod config;
pub mod error;
pub mod show;

pub use config::PandoraConfig;
pub use error::PandoraError;
pub use show::Show;
