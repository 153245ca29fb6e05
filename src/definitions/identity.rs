use std::fmt;
use std::str::FromStr;

use const_oid::{
    db::rfc4519::{
        COMMON_NAME, COUNTRY_NAME, GIVEN_NAME, LOCALITY_NAME, ORGANIZATIONAL_UNIT_NAME,
        ORGANIZATION_NAME, POSTAL_CODE, SERIAL_NUMBER, ST, STREET, SURNAME,
    },
    ObjectIdentifier,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use x509_cert::name::Name;

use super::x509::util::name_values;

pub const COUNTRY_EE: &str = "EE";
pub const COUNTRY_LV: &str = "LV";
pub const COUNTRY_LT: &str = "LT";
pub const COUNTRY_KZ: &str = "KZ";

/// Flattened view of a certificate distinguished name.
///
/// Multi-valued attributes are concatenated in encoding order. For the serial
/// number and common name the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub country: String,
    pub organization: String,
    pub organizational_unit: String,
    pub locality: String,
    pub province: String,
    pub street_address: String,
    pub postal_code: String,
    pub serial_number: String,
    pub common_name: String,
    pub given_name: String,
    pub surname: String,
}

impl Identity {
    pub fn from_name(name: &Name) -> Self {
        let joined = |oid: ObjectIdentifier| name_values(name, oid).collect::<String>();
        let last = |oid: ObjectIdentifier| {
            name_values(name, oid)
                .last()
                .map(str::to_string)
                .unwrap_or_default()
        };

        Self {
            country: joined(COUNTRY_NAME),
            organization: joined(ORGANIZATION_NAME),
            organizational_unit: joined(ORGANIZATIONAL_UNIT_NAME),
            locality: joined(LOCALITY_NAME),
            province: joined(ST),
            street_address: joined(STREET),
            postal_code: joined(POSTAL_CODE),
            serial_number: last(SERIAL_NUMBER),
            common_name: last(COMMON_NAME),
            given_name: joined(GIVEN_NAME),
            surname: joined(SURNAME),
        }
    }

    /// The serial number read as a semantic identifier, when it is one.
    pub fn semantic_identifier(&self) -> Option<SemanticIdentifier> {
        self.serial_number.parse().ok()
    }
}

/// Kind of document a semantic identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum IdentifierType {
    /// Passport number.
    #[strum(serialize = "PAS")]
    Pas,
    /// National identity card number.
    #[strum(serialize = "IDC")]
    Idc,
    /// National personal number.
    #[strum(serialize = "PNO")]
    Pno,
}

/// ETSI natural person semantics identifier, e.g. `PNOEE-30303039914`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticIdentifier {
    pub identifier_type: IdentifierType,
    pub country: String,
    pub id: String,
}

impl SemanticIdentifier {
    pub fn new(
        identifier_type: IdentifierType,
        country: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            identifier_type,
            country: country.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for SemanticIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.identifier_type, self.country, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a semantic identifier: {0}")]
pub struct ParseIdentifierError(String);

impl FromStr for SemanticIdentifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdentifierError(s.to_string());
        let (prefix, id) = s.split_once('-').ok_or_else(err)?;
        if prefix.len() != 5 || !prefix.is_ascii() || id.is_empty() {
            return Err(err());
        }
        let (identifier_type, country) = prefix.split_at(3);
        Ok(Self {
            identifier_type: identifier_type.parse().map_err(|_| err())?,
            country: country.to_string(),
            id: id.to_string(),
        })
    }
}
