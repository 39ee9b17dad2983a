//! Types common to all things X.509.

use std::{error, fmt, ops, str};
use std::str::FromStr;
use bcder::decode;
use bcder::{Captured, Oid, Tag};
use bcder::decode::{Content, ContentError, DecodeError, Source};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use crate::oid;
use crate::util::hex;


//------------ Name ----------------------------------------------------------

/// An X.500 distinguished name.
///
/// The name keeps its original encoding for comparison and a decoded
/// sequence of relative distinguished names for display.
///
/// The `Display` implementation produces the string representation of
/// [RFC 4514]: the relative distinguished names are given starting with the
/// last one, separated by a comma and a space. The members of a
/// multi-valued name are separated by a plus sign surrounded by spaces.
///
/// [RFC 4514]: https://tools.ietf.org/html/rfc4514
#[derive(Clone, Debug)]
pub struct Name {
    captured: Captured,
    rdns: Vec<RelativeName>,
}

impl Name {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let captured = cons.capture_one()?;
        let rdns = captured.clone().decode(
            Self::take_rdns
        ).map_err(DecodeError::convert)?;
        Ok(Name { captured, rdns })
    }

    fn take_rdns<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Vec<RelativeName>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| { // RDNSequence
            let mut rdns = Vec::new();
            while let Some(rdn) = cons.take_opt_set(|cons| {
                let mut attrs = Vec::new();
                while let Some(attr) = cons.take_opt_sequence(
                    Attribute::from_constructed
                )? {
                    attrs.push(attr)
                }
                if attrs.is_empty() {
                    return Err(cons.content_err(
                        "empty relative distinguished name"
                    ))
                }
                Ok(RelativeName(attrs))
            })? {
                rdns.push(rdn)
            }
            Ok(rdns)
        })
    }

    /// Returns the relative distinguished names in encoding order.
    pub fn rdns(&self) -> &[RelativeName] {
        &self.rdns
    }

    /// Returns whether the name doesn’t contain any attributes at all.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Returns the most specific common name if there is one.
    pub fn common_name(&self) -> Option<&str> {
        self.rdns.iter().rev().flat_map(|rdn| rdn.0.iter()).find_map(|attr| {
            if attr.attr_type == oid::AT_COMMON_NAME {
                attr.value.as_str()
            }
            else {
                None
            }
        })
    }

    /// Returns the DER encoding of the name.
    pub fn as_slice(&self) -> &[u8] {
        self.captured.as_slice()
    }
}

//--- PartialEq and Eq

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.captured.as_slice() == other.captured.as_slice()
    }
}

impl Eq for Name {}

//--- Display

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for rdn in self.rdns.iter().rev() {
            if first {
                first = false
            }
            else {
                f.write_str(", ")?;
            }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}


//------------ RelativeName --------------------------------------------------

/// A relative distinguished name.
///
/// This is a set of one or more attributes. Almost always, there is only
/// exactly one.
#[derive(Clone, Debug)]
pub struct RelativeName(Vec<Attribute>);

impl RelativeName {
    pub fn attributes(&self) -> &[Attribute] {
        &self.0
    }
}

impl fmt::Display for RelativeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for attr in &self.0 {
            if first {
                first = false
            }
            else {
                f.write_str(" + ")?;
            }
            write!(f, "{}", attr)?;
        }
        Ok(())
    }
}


//------------ Attribute -----------------------------------------------------

/// A single attribute type and value pair of a name.
#[derive(Clone, Debug)]
pub struct Attribute {
    attr_type: Oid<Bytes>,
    value: AttributeValue,
}

impl Attribute {
    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let attr_type = Oid::take_from(cons)?;
        let captured = cons.capture_one()?;
        let value = match captured.clone().decode(
            AttributeValue::take_string
        ).map_err(DecodeError::convert)? {
            Some(value) => AttributeValue::String(value),
            None => AttributeValue::Other(captured.into_bytes()),
        };
        Ok(Attribute { attr_type, value })
    }

    pub fn attr_type(&self) -> &Oid<Bytes> {
        &self.attr_type
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Returns the short name for the attribute type if there is one.
    pub fn label(&self) -> Option<&'static str> {
        let id = &self.attr_type;
        if *id == oid::AT_COMMON_NAME { Some("CN") }
        else if *id == oid::AT_ORGANIZATIONAL_UNIT_NAME { Some("OU") }
        else if *id == oid::AT_ORGANIZATION_NAME { Some("O") }
        else if *id == oid::AT_LOCALITY_NAME { Some("L") }
        else if *id == oid::AT_STATE_OR_PROVINCE_NAME { Some("ST") }
        else if *id == oid::AT_COUNTRY_NAME { Some("C") }
        else if *id == oid::AT_STREET_ADDRESS { Some("STREET") }
        else if *id == oid::AT_DOMAIN_COMPONENT { Some("DC") }
        else if *id == oid::AT_USER_ID { Some("UID") }
        else if *id == oid::AT_EMAIL_ADDRESS { Some("E") }
        else if *id == oid::AT_SERIAL_NUMBER { Some("SERIALNUMBER") }
        else if *id == oid::AT_TITLE { Some("T") }
        else if *id == oid::AT_SURNAME { Some("SN") }
        else if *id == oid::AT_GIVEN_NAME { Some("GN") }
        else { None }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}=", label)?,
            None => write!(f, "{}=", self.attr_type)?,
        }
        write!(f, "{}", self.value)
    }
}


//------------ AttributeValue ------------------------------------------------

/// The value of a name attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeValue {
    /// The value is one of the character string types.
    String(String),

    /// The value is something else. This is its complete DER encoding.
    Other(Bytes),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            AttributeValue::String(ref s) => Some(s.as_str()),
            AttributeValue::Other(_) => None,
        }
    }

    /// Takes a single value and returns its content if it is a string.
    fn take_string<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<String>, DecodeError<S::Error>> {
        cons.take_value(|tag, content| {
            match content {
                Content::Primitive(prim) => {
                    let data = prim.take_all()?;
                    decode_string(tag, data.as_ref()).map_err(|err| {
                        prim.content_err(err)
                    })
                }
                Content::Constructed(inner) => {
                    inner.skip_all()?;
                    Ok(None)
                }
            }
        })
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AttributeValue::String(ref s) => write_escaped(s, f),
            AttributeValue::Other(ref data) => {
                f.write_str("#")?;
                hex::write(data.as_ref(), f)
            }
        }
    }
}

/// Decodes the content of a string value.
///
/// Returns `Ok(None)` if `tag` isn’t one of the string types.
fn decode_string(
    tag: Tag, data: &[u8]
) -> Result<Option<String>, &'static str> {
    if tag == Tag::UTF8_STRING {
        String::from_utf8(data.into()).map(Some).map_err(|_| {
            "invalid UTF8String"
        })
    }
    else if tag == Tag::PRINTABLE_STRING || tag == Tag::IA5_STRING
        || tag == Tag::NUMERIC_STRING || tag == Tag::VISIBLE_STRING
    {
        if data.is_ascii() {
            Ok(Some(data.iter().copied().map(char::from).collect()))
        }
        else {
            Err("non-ASCII character in restricted string")
        }
    }
    else if tag == Tag::TELETEX_STRING {
        // In practice, T61String values contain Latin-1.
        Ok(Some(data.iter().copied().map(char::from).collect()))
    }
    else if tag == Tag::BMP_STRING {
        if data.len() % 2 != 0 {
            return Err("invalid BMPString")
        }
        let units = data.chunks(2).map(|ch| {
            u16::from_be_bytes([ch[0], ch[1]])
        });
        char::decode_utf16(units).collect::<Result<String, _>>()
            .map(Some).map_err(|_| "invalid BMPString")
    }
    else if tag == Tag::UNIVERSAL_STRING {
        if data.len() % 4 != 0 {
            return Err("invalid UniversalString")
        }
        data.chunks(4).map(|ch| {
            char::from_u32(u32::from_be_bytes([ch[0], ch[1], ch[2], ch[3]]))
        }).collect::<Option<String>>().map(Some).ok_or(
            "invalid UniversalString"
        )
    }
    else {
        Ok(None)
    }
}

/// Writes a string value escaped as required by RFC 4514.
fn write_escaped(s: &str, f: &mut fmt::Formatter) -> fmt::Result {
    let last = s.chars().count().saturating_sub(1);
    for (idx, ch) in s.chars().enumerate() {
        match ch {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                write!(f, "\\{}", ch)?
            }
            '#' if idx == 0 => f.write_str("\\#")?,
            ' ' if idx == 0 || idx == last => f.write_str("\\ ")?,
            '\0' => f.write_str("\\00")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    Ok(())
}


//------------ Serial --------------------------------------------------------

/// A certificate serial number.
///
/// Serial numbers are positive integers of up to 20 octets. Since there
/// are certificates out there with negative or longer serial numbers, the
/// value is kept as the content octets of the encoded integer.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Serial(Bytes);

impl Serial {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::INTEGER, |prim| {
            let data = prim.take_all()?;
            if data.is_empty() {
                return Err(prim.content_err("empty serial number"))
            }
            Ok(Serial(data))
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        hex::write(self.0.as_ref(), f)
    }
}

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Serial({self})")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Serial {
    fn serialize<S: serde::Serializer>(
        &self, serializer: S
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}


//------------ Time ----------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Creates a time value from its components.
    ///
    /// Returns `None` if the components don’t describe a valid time.
    pub fn utc(
        year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).single()
            .map(Time)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive(|tag, prim| {
            match tag {
                Tag::UTC_TIME => {
                    // RFC 5280 requires the format YYMMDDHHMMSSZ
                    let year = read_two_char(prim)? as i32;
                    let year = if year >= 50 { year + 1900 }
                               else { year + 2000 };
                    let res = (
                        year,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                    );
                    if prim.take_u8()? != b'Z' {
                        return Err(prim.content_err(
                            "malformed time value"
                        ))
                    }
                    Self::from_parts(res).map_err(|err| prim.content_err(err))
                }
                Tag::GENERALIZED_TIME => {
                    // RFC 5280 requires the format YYYYMMDDHHMMSSZ
                    let res = (
                        read_four_char(prim)? as i32,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                        read_two_char(prim)?,
                    );
                    if prim.take_u8()? != b'Z' {
                        return Err(prim.content_err(
                            "malformed time value"
                        ))
                    }
                    Self::from_parts(res).map_err(|err| prim.content_err(err))
                }
                _ => {
                    Err(prim.content_err(
                        "malformed time value"
                    ))
                }
            }
        })
    }

    fn from_parts(
        parts: (i32, u32, u32, u32, u32, u32)
    ) -> Result<Self, ContentError> {
        Self::utc(
            parts.0, parts.1, parts.2, parts.3, parts.4, parts.5
        ).ok_or_else(|| ContentError::from_static("malformed time value"))
    }

    pub fn verify_not_before(
        &self,
        now: Time
    ) -> Result<(), ValidityPeriodError> {
        if now.0 < self.0 {
            Err(ValidityPeriodError::too_new())
        }
        else {
            Ok(())
        }
    }

    pub fn verify_not_after(
        &self,
        now: Time
    ) -> Result<(), ValidityPeriodError> {
        if now.0 > self.0 {
            Err(ValidityPeriodError::too_old())
        }
        else {
            Ok(())
        }
    }
}


//--- Deref and AsRef

impl ops::Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}


//--- From

impl From<DateTime<Utc>> for Time {
    fn from(time: DateTime<Utc>) -> Self {
        Time(time)
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(time: Time) -> Self {
        time.0
    }
}


//--- Display

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}


fn read_two_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 2];
    s[0] = source.take_u8()?;
    s[1] = source.take_u8()?;
    read_digits(source, &s)
}


fn read_four_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 4];
    s[0] = source.take_u8()?;
    s[1] = source.take_u8()?;
    s[2] = source.take_u8()?;
    s[3] = source.take_u8()?;
    read_digits(source, &s)
}

fn read_digits<S: decode::Source>(
    source: &S, s: &[u8]
) -> Result<u32, DecodeError<S::Error>> {
    // u32::from_str would accept a leading plus sign.
    if !s.iter().all(u8::is_ascii_digit) {
        return Err(source.content_err("malformed time value"))
    }
    let s = str::from_utf8(s).map_err(|_| {
        source.content_err("malformed time value")
    })?;
    u32::from_str(s).map_err(|_err| {
        source.content_err("malformed time value")
    })
}


//------------ Validity ------------------------------------------------------

#[derive(Clone, Debug, Copy, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Validity {
    not_before: Time,
    not_after: Time,
}

impl Validity {
    pub fn new(not_before: Time, not_after: Time) -> Self {
        Validity { not_before, not_after }
    }

    pub fn not_before(self) -> Time {
        self.not_before
    }

    pub fn not_after(self) -> Time {
        self.not_after
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(Validity::new(
                Time::take_from(cons)?,
                Time::take_from(cons)?,
            ))
        })
    }

    pub fn verify(self) -> Result<(), ValidityPeriodError> {
        self.verify_at(Time::now())
    }

    pub fn verify_at(self, now: Time) -> Result<(), ValidityPeriodError> {
        self.not_before.verify_not_before(now)?;
        self.not_after.verify_not_after(now)?;
        Ok(())
    }
}


//------------ ValidityPeriodError -------------------------------------------

/// A certificate is outside of its period of validity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidityPeriodError {
    /// Is the certificate too new?
    ///
    /// It is too old otherwise.
    too_new: bool,
}

impl ValidityPeriodError {
    fn too_new() -> Self {
        ValidityPeriodError { too_new: true }
    }

    fn too_old() -> Self {
        ValidityPeriodError { too_new: false }
    }

    pub fn is_not_yet_valid(self) -> bool {
        self.too_new
    }

    pub fn is_expired(self) -> bool {
        !self.too_new
    }
}

impl fmt::Display for ValidityPeriodError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(
            if self.too_new {
                "certificate is not yet valid"
            }
            else {
                "certificate has expired"
            }
        )
    }
}

impl error::Error for ValidityPeriodError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use bcder::Mode;

    fn name(data: &'static [u8]) -> Name {
        Mode::Der.decode(data, Name::take_from).unwrap()
    }

    #[test]
    fn name_display() {
        // C=US, O=Test, CN=host
        let name = name(
            b"\x30\x2d\
              \x31\x0b\x30\x09\x06\x03\x55\x04\x06\x13\x02US\
              \x31\x0d\x30\x0b\x06\x03\x55\x04\x0a\x0c\x04Test\
              \x31\x0f\x30\x0d\x06\x03\x55\x04\x03\x0c\x06a;b, c"
        );
        assert_eq!(name.to_string(), "CN=a\\;b\\, c, O=Test, C=US");
        assert_eq!(name.common_name(), Some("a;b, c"));
        assert_eq!(name.rdns().len(), 3);
    }

    #[test]
    fn name_unknown_and_binary_values() {
        // 1.2.3=<UTF8 " x ">, 2.5.4.3=<INTEGER 261>
        let name = name(
            b"\x30\x1a\
              \x31\x0b\x30\x09\x06\x02\x2a\x03\x0c\x03 x \
              \x31\x0b\x30\x09\x06\x03\x55\x04\x03\x02\x02\x01\x05"
        );
        assert_eq!(name.to_string(), "CN=#02020105, 1.2.3=\\ x\\ ");
        assert_eq!(name.common_name(), None);
    }

    #[test]
    fn name_bmp_string() {
        let name = name(
            b"\x30\x11\x31\x0f\x30\x0d\x06\x03\x55\x04\x03\
              \x1e\x06\x00\x41\x00\xe4\x00\x21"
        );
        assert_eq!(name.to_string(), "CN=A\u{e4}!");

        // Odd length BMPString.
        assert!(Mode::Der.decode(
            b"\x30\x10\x31\x0e\x30\x0c\x06\x03\x55\x04\x03\
              \x1e\x05\x00\x41\x00\xe4\x00".as_ref(),
            Name::take_from
        ).is_err());
    }

    #[test]
    fn empty_name() {
        let name = name(b"\x30\x00");
        assert!(name.is_empty());
        assert_eq!(name.to_string(), "");
        assert!(Mode::Der.decode(
            b"\x30\x02\x31\x00".as_ref(), Name::take_from
        ).is_err());
    }

    #[test]
    fn serial_take_from() {
        let serial = Mode::Der.decode(
            b"\x02\x03\x01\x02\x03".as_ref(), Serial::take_from
        ).unwrap();
        assert_eq!(serial.as_slice(), b"\x01\x02\x03");
        assert_eq!(serial.to_string(), "010203");
        assert!(Mode::Der.decode(
            b"\x02\x00".as_ref(), Serial::take_from
        ).is_err());
    }

    #[test]
    fn time_take_from() {
        assert_eq!(
            Mode::Der.decode(
                b"\x17\x0d261019194936Z".as_ref(), Time::take_from
            ).unwrap(),
            Time::utc(2026, 10, 19, 19, 49, 36).unwrap()
        );
        assert_eq!(
            Mode::Der.decode(
                b"\x17\x0d491231235959Z".as_ref(), Time::take_from
            ).unwrap(),
            Time::utc(2049, 12, 31, 23, 59, 59).unwrap()
        );
        assert_eq!(
            Mode::Der.decode(
                b"\x17\x0d500101000000Z".as_ref(), Time::take_from
            ).unwrap(),
            Time::utc(1950, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            Mode::Der.decode(
                b"\x18\x0f20671113194941Z".as_ref(), Time::take_from
            ).unwrap(),
            Time::utc(2067, 11, 13, 19, 49, 41).unwrap()
        );
        assert!(Mode::Der.decode(
            b"\x17\x0d261319194936Z".as_ref(), Time::take_from
        ).is_err());
        assert!(Mode::Der.decode(
            b"\x17\x0d2610191949+6Z".as_ref(), Time::take_from
        ).is_err());
        assert!(Mode::Der.decode(
            b"\x17\x0d261019194936X".as_ref(), Time::take_from
        ).is_err());
    }

    #[test]
    fn validity_verify_at() {
        let validity = Validity::new(
            Time::utc(2020, 1, 1, 0, 0, 0).unwrap(),
            Time::utc(2030, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(
            validity.verify_at(Time::utc(2025, 6, 1, 0, 0, 0).unwrap()).is_ok()
        );
        assert!(
            validity.verify_at(
                Time::utc(2019, 6, 1, 0, 0, 0).unwrap()
            ).unwrap_err().is_not_yet_valid()
        );
        assert!(
            validity.verify_at(
                Time::utc(2031, 6, 1, 0, 0, 0).unwrap()
            ).unwrap_err().is_expired()
        );
    }

    #[test]
    fn time_display() {
        assert_eq!(
            Time::utc(2036, 10, 16, 19, 49, 36).unwrap().to_string(),
            "2036-10-16 19:49:36 UTC"
        );
    }
}
