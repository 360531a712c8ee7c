use crate::base::neterror::NetError;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Walks the resolved endpoints and returns the first TCP connection.
/// Roughly equivalent to net::TransportConnectJob, minus happy-eyeballs:
/// attempts are strictly sequential, in resolver order.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect<I>(host: &str, endpoints: I) -> Result<TcpStream, NetError>
    where
        I: IntoIterator<Item = SocketAddr>,
    {
        let mut attempts = 0;
        let mut last_error = None;

        for addr in endpoints {
            attempts += 1;
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::trace!(error = %e, "failed to set TCP_NODELAY");
                    }
                    tracing::debug!(host = %host, addr = %addr, attempts, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(host = %host, addr = %addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(NetError::connection_failed_to(host, attempts, last_error))
    }
}
