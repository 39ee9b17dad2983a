//! The object identifiers used in this crate.
//!
//! This module collects the object identifiers used at various places in
//! this crate in one central place. They are public so you can refer to
//! them should that ever become necessary.

use bcder::{ConstOid, Oid};


//------------ Attribute Types -----------------------------------------------
//
// RFC 4519 and RFC 5280, appendix A.

pub const AT_COMMON_NAME: ConstOid = Oid(&[85, 4, 3]); // 2 5 4 3
pub const AT_SURNAME: ConstOid = Oid(&[85, 4, 4]); // 2 5 4 4
pub const AT_SERIAL_NUMBER: ConstOid = Oid(&[85, 4, 5]); // 2 5 4 5
pub const AT_COUNTRY_NAME: ConstOid = Oid(&[85, 4, 6]); // 2 5 4 6
pub const AT_LOCALITY_NAME: ConstOid = Oid(&[85, 4, 7]); // 2 5 4 7
pub const AT_STATE_OR_PROVINCE_NAME: ConstOid
    = Oid(&[85, 4, 8]); // 2 5 4 8
pub const AT_STREET_ADDRESS: ConstOid = Oid(&[85, 4, 9]); // 2 5 4 9
pub const AT_ORGANIZATION_NAME: ConstOid = Oid(&[85, 4, 10]); // 2 5 4 10
pub const AT_ORGANIZATIONAL_UNIT_NAME: ConstOid
    = Oid(&[85, 4, 11]); // 2 5 4 11
pub const AT_TITLE: ConstOid = Oid(&[85, 4, 12]); // 2 5 4 12
pub const AT_GIVEN_NAME: ConstOid = Oid(&[85, 4, 42]); // 2 5 4 42

/// [RFC 4519](https://tools.ietf.org/html/rfc4519) `uid`
pub const AT_USER_ID: ConstOid
    = Oid(&[9, 146, 38, 137, 147, 242, 44, 100, 1, 1]);

/// [RFC 4519](https://tools.ietf.org/html/rfc4519) `dc`
pub const AT_DOMAIN_COMPONENT: ConstOid
    = Oid(&[9, 146, 38, 137, 147, 242, 44, 100, 1, 25]);

/// [RFC 2985](https://tools.ietf.org/html/rfc2985) `pkcs-9-at-emailAddress`
///
/// Deprecated but still widely used in subject names.
pub const AT_EMAIL_ADDRESS: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 1]);


//------------ Content Types -------------------------------------------------

/// [RFC 5652](https://tools.ietf.org/html/rfc5652) `id-data`
///
/// The authenticated safe of a PKCS #12 container is wrapped in this.
pub const PKCS7_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 1]);
