use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use native_tls::{Certificate, Identity, TlsConnector};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::conn::connection::Conn;
use crate::conn::stmt::StatementHandler;

/// Configuration function applied to a freshly dialed session, in order, before the handshake.
/// A failing option aborts the connect and closes the transport.
pub type ConnOption = Box<dyn FnOnce(&mut Conn) -> CResult<()>>;

pub fn with_read_timeout(timeout: Duration) -> ConnOption {
    Box::new(move |conn| {
        conn.read_timeout = Some(timeout);
        Ok(())
    })
}

pub fn with_write_timeout(timeout: Duration) -> ConnOption {
    Box::new(move |conn| {
        conn.write_timeout = Some(timeout);
        Ok(())
    })
}

pub fn with_buffer_size(buffer_size: usize) -> ConnOption {
    Box::new(move |conn| {
        if buffer_size == 0 {
            return Err(ReError::ConfigurationError(String::from(
                "buffer size must be greater than 0",
            )));
        }
        conn.buffer_size = buffer_size;
        Ok(())
    })
}

/// TLS with the system roots. `insecure_skip_verify` accepts any certificate and host name.
pub fn with_ssl(insecure_skip_verify: bool) -> ConnOption {
    Box::new(move |conn| {
        conn.use_ssl(insecure_skip_verify);
        Ok(())
    })
}

pub fn with_ssl_opts(ssl_opts: SslOpts) -> ConnOption {
    Box::new(move |conn| {
        conn.set_ssl_opts(ssl_opts);
        Ok(())
    })
}

pub fn with_collation(collation: &str) -> ConnOption {
    let collation = collation.to_string();
    Box::new(move |conn| conn.set_collation(&collation))
}

/// Charset sent in the handshake when no collation is set.
pub fn with_charset(charset: &str) -> ConnOption {
    let charset = charset.to_string();
    Box::new(move |conn| conn.set_handshake_charset(&charset))
}

pub fn with_attributes(attributes: HashMap<String, String>) -> ConnOption {
    Box::new(move |conn| {
        conn.set_attributes(attributes);
        Ok(())
    })
}

pub fn with_capability(capability: u32) -> ConnOption {
    Box::new(move |conn| {
        conn.set_capability(capability);
        Ok(())
    })
}

pub fn without_capability(capability: u32) -> ConnOption {
    Box::new(move |conn| {
        conn.unset_capability(capability);
        Ok(())
    })
}

pub fn with_statement_handler(handler: Box<dyn StatementHandler>) -> ConnOption {
    Box::new(move |conn| {
        conn.set_statement_handler(handler);
        Ok(())
    })
}

/// Ssl 配置.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct SslOpts {
    client_identity: Option<ClientIdentity>,
    root_cert_path: Option<String>,
    skip_domain_validation: bool,
    accept_invalid_certs: bool,
}

/// SSL配置属性
impl SslOpts {
    /// 设置 client identity.
    pub fn with_client_identity(mut self, identity: Option<ClientIdentity>) -> Self {
        self.client_identity = identity;
        self
    }

    /// 设置证书路径
    ///
    /// 支持证书格式 .der .pem, pem证书中允许多个证书
    pub fn with_root_cert_path(mut self, root_cert_path: Option<String>) -> Self {
        self.root_cert_path = root_cert_path;
        self
    }

    /// 不验证服务器域
    /// (defaults to `false`).
    pub fn with_danger_skip_domain_validation(mut self, value: bool) -> Self {
        self.skip_domain_validation = value;
        self
    }

    /// true时接受无效证书
    /// (defaults to `false`).
    pub fn with_danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.accept_invalid_certs = value;
        self
    }

    pub fn client_identity(&self) -> Option<&ClientIdentity> {
        self.client_identity.as_ref()
    }

    pub fn root_cert_path(&self) -> Option<&Path> {
        self.root_cert_path.as_ref().map(Path::new)
    }

    pub fn skip_domain_validation(&self) -> bool {
        self.skip_domain_validation
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub(crate) fn build_connector(&self) -> CResult<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if let Some(root_cert_path) = self.root_cert_path() {
            let mut root_cert_data = vec![];
            let mut root_cert_file = File::open(root_cert_path)?;
            root_cert_file.read_to_end(&mut root_cert_data)?;

            let root_certs = Certificate::from_der(&root_cert_data)
                .map(|x| vec![x])
                .or_else(|_| {
                    pem::parse_many(&*root_cert_data)
                        .unwrap_or_default()
                        .iter()
                        .map(pem::encode)
                        .map(|s| Certificate::from_pem(s.as_bytes()))
                        .collect()
                })
                .map_err(|err| {
                    ReError::ConfigurationError(format!("The ssl cert can not load. err:{{{err}}}"))
                })?;

            for root_cert in root_certs {
                builder.add_root_certificate(root_cert);
            }
        }
        if let Some(client_identity) = self.client_identity() {
            builder.identity(client_identity.load()?);
        }
        builder.danger_accept_invalid_hostnames(self.skip_domain_validation);
        builder.danger_accept_invalid_certs(self.accept_invalid_certs);

        builder
            .build()
            .map_err(|err| ReError::ConfigurationError(format!("Can not build tls. err:{{{err}}}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pkcs12_path: String,
    password: Option<String>,
}

impl ClientIdentity {
    /// Creates new identity with the given path to the pkcs12 archive.
    pub fn new(pkcs12_path: &str) -> Self {
        Self {
            pkcs12_path: pkcs12_path.to_string(),
            password: None,
        }
    }

    /// Sets the archive password.
    pub fn with_password(mut self, pass: &str) -> Self {
        self.password = Some(pass.to_string());
        self
    }

    /// Returns the pkcs12 archive path.
    pub fn pkcs12_path(&self) -> &Path {
        Path::new(&self.pkcs12_path)
    }

    /// Returns the archive password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub(crate) fn load(&self) -> CResult<Identity> {
        let der = std::fs::read(&self.pkcs12_path)?;
        Identity::from_pkcs12(&der, self.password.as_deref().unwrap_or("")).map_err(|err| {
            ReError::ConfigurationError(format!("Can not load identity. err:{{{err}}}"))
        })
    }
}
