//! AFIP web services client
//!
//! WSAA authentication (TRA signed as CMS, exchanged for an access
//! ticket) and the WSFE v1 calls used to authorise electronic invoices.
//!
//! ```no_run
//! # async fn run(signer: std::sync::Arc<dyn gestion_cert::CmsSigner>) -> afip_client::Result<()> {
//! use std::sync::Arc;
//! use afip_client::{AfipConfig, Environment, MemoryTicketStore};
//!
//! let config = AfipConfig::new(20123456789, Environment::Testing);
//! let wsfe = afip_client::connect(&config, signer, Arc::new(MemoryTicketStore::new()))?;
//! let last = wsfe.last_voucher(1, 6).await?;
//! # Ok(())
//! # }
//! ```

mod env;
mod error;
pub mod soap;
mod ticket;
mod tra;
mod wsaa;
mod wsfe;

use std::sync::Arc;

use gestion_cert::CmsSigner;

pub use env::{AfipConfig, Endpoints, Environment};
pub use error::{AfipError, Result, TICKET_ERROR_CODES};
pub use ticket::{FileTicketStore, MemoryTicketStore, TicketManager, TicketStore};
pub use tra::LoginTicketRequest;
pub use wsaa::{AccessTicket, Authenticator, Wsaa, parse_login_response};
pub use wsfe::{SERVICE as WSFE_SERVICE, ServerStatus, Wsfe, parse_cae_response};

/// Wire WSAA, the ticket cache and WSFE together
pub fn connect(
    config: &AfipConfig,
    signer: Arc<dyn CmsSigner>,
    store: Arc<dyn TicketStore>,
) -> Result<Wsfe> {
    let wsaa = Arc::new(Wsaa::new(config, signer)?);
    let tickets = Arc::new(TicketManager::new(wsaa, store, config.ticket_margin));
    tracing::info!(
        cuit = config.cuit,
        environment = config.environment.name(),
        "AFIP client ready"
    );
    Wsfe::new(config, tickets)
}
