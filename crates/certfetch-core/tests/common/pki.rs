//! A tiny private PKI: one CA, a server leaf for 127.0.0.1 and a client leaf.

use std::path::{Path, PathBuf};

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::extension::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
};
use openssl::x509::{X509Builder, X509NameBuilder, X509};

pub const CLIENT_CN: &str = "certfetch-client";

pub struct Leaf {
    pub key: PKey<Private>,
    pub cert: X509,
}

pub struct Pki {
    pub ca_key: PKey<Private>,
    pub ca: X509,
    pub server: Leaf,
    pub client: Leaf,
}

impl Pki {
    pub fn new() -> Self {
        Self::with_ca_name("certfetch test ca")
    }

    pub fn with_ca_name(ca_name: &str) -> Self {
        let ca_key = new_key();
        let ca = build_ca(ca_name, &ca_key);
        let server = issue(&ca, &ca_key, "localhost", Role::Server);
        let client = issue(&ca, &ca_key, CLIENT_CN, Role::Client);
        Self {
            ca_key,
            ca,
            server,
            client,
        }
    }

    /// DER PKCS#12 of the client leaf, its key and the CA as chain.
    pub fn client_bundle(&self, password: &str) -> Vec<u8> {
        let mut chain = Stack::new().unwrap();
        chain.push(self.ca.clone()).unwrap();
        let mut builder = Pkcs12::builder();
        builder
            .name(CLIENT_CN)
            .pkey(&self.client.key)
            .cert(&self.client.cert)
            .ca(chain);
        builder.build2(password).unwrap().to_der().unwrap()
    }

    /// Writes the CA certificate as PEM into `dir` and returns its path.
    pub fn write_ca_pem(&self, dir: &Path) -> PathBuf {
        let path = dir.join("ca.pem");
        std::fs::write(&path, self.ca.to_pem().unwrap()).unwrap();
        path
    }
}

enum Role {
    Server,
    Client,
}

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn base_builder(cn: &str, key: &PKey<Private>) -> X509Builder {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(2).unwrap())
        .unwrap();
    builder
}

fn build_ca(cn: &str, key: &PKey<Private>) -> X509 {
    let mut builder = base_builder(cn, key);
    let mut issuer = X509NameBuilder::new().unwrap();
    issuer.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    builder.set_issuer_name(&issuer.build()).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

fn issue(ca: &X509, ca_key: &PKey<Private>, cn: &str, role: Role) -> Leaf {
    let key = new_key();
    let mut builder = base_builder(cn, &key);
    builder.set_issuer_name(ca.subject_name()).unwrap();
    builder
        .append_extension(BasicConstraints::new().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_agreement()
                .build()
                .unwrap(),
        )
        .unwrap();
    match role {
        Role::Server => {
            builder
                .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
                .unwrap();
            let san = SubjectAlternativeName::new()
                .ip("127.0.0.1")
                .dns("localhost")
                .build(&builder.x509v3_context(Some(ca), None))
                .unwrap();
            builder.append_extension(san).unwrap();
        }
        Role::Client => {
            builder
                .append_extension(ExtendedKeyUsage::new().client_auth().build().unwrap())
                .unwrap();
        }
    }
    builder.sign(ca_key, MessageDigest::sha256()).unwrap();
    Leaf {
        key,
        cert: builder.build(),
    }
}
