//! HTTPS server that requires a client certificate issued by the test CA.
//!
//! Answers every request with `{"client": <peer certificate CN>}`.

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use openssl::nid::Nid;
use openssl::ssl::{SslAcceptor, SslMethod, SslVerifyMode};
use openssl::x509::store::X509StoreBuilder;

use super::json_server::{read_request, write_response};
use super::pki::Pki;

pub struct TlsServer {
    port: u16,
    served: Arc<AtomicUsize>,
}

impl TlsServer {
    pub fn url(&self, path: &str) -> String {
        format!("https://127.0.0.1:{}/{}", self.port, path.trim_start_matches('/'))
    }

    /// Requests read over a connection with a verified client certificate.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

/// Serves with `pki.server` and accepts only clients chaining to `pki.ca`.
pub fn start(pki: &Pki) -> TlsServer {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pki.server.key).unwrap();
    acceptor.set_certificate(&pki.server.cert).unwrap();
    acceptor.add_extra_chain_cert(pki.ca.clone()).unwrap();
    let mut store = X509StoreBuilder::new().unwrap();
    store.add_cert(pki.ca.clone()).unwrap();
    acceptor.set_verify_cert_store(store.build()).unwrap();
    acceptor.set_verify(SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT);
    let acceptor = Arc::new(acceptor.build());

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let served = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&served);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let acceptor = Arc::clone(&acceptor);
            let counter = Arc::clone(&counter);
            thread::spawn(move || serve(&acceptor, stream, &counter));
        }
    });
    TlsServer { port, served }
}

fn serve(acceptor: &SslAcceptor, stream: TcpStream, served: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let Ok(mut tls) = acceptor.accept(stream) else {
        return;
    };
    let client = tls
        .ssl()
        .peer_certificate()
        .and_then(|cert| {
            cert.subject_name()
                .entries_by_nid(Nid::COMMONNAME)
                .next()
                .and_then(|e| e.data().as_utf8().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_default();
    if read_request(&mut tls).is_none() {
        return;
    }
    served.fetch_add(1, Ordering::SeqCst);
    let doc = serde_json::json!({ "client": client });
    write_response(&mut tls, 200, doc.to_string().as_bytes());
    let _ = tls.shutdown();
}
