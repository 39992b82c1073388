//! Throwaway keys and certificates for unit tests.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

pub(crate) struct Identity {
    pub key: PKey<Private>,
    pub cert: X509,
}

impl Identity {
    pub fn self_signed(common_name: &str) -> Self {
        let key = new_key();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        Self {
            key,
            cert: builder.build(),
        }
    }

    /// DER-encoded PKCS#12 bundle of this identity plus `chain`.
    pub fn bundle(&self, password: &str, chain: &[X509]) -> Vec<u8> {
        let mut builder = Pkcs12::builder();
        builder.name("client").pkey(&self.key).cert(&self.cert);
        if !chain.is_empty() {
            let mut stack = Stack::new().unwrap();
            for ca in chain {
                stack.push(ca.clone()).unwrap();
            }
            builder.ca(stack);
        }
        builder.build2(password).unwrap().to_der().unwrap()
    }
}

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}
