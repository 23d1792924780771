//! Domain records and their line formats

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Field delimiter of the tenant and parking-spot stores
pub const FIELD_DELIMITER: char = ',';

/// Leading token of every reservation log line
pub const RESERVATION_PREFIX: &str = "Reserva N°";

/// Date format used for payments and reservations (dd/mm/yyyy)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Index of the paid flag within a parking-spot record
pub const PAID_FIELD_INDEX: usize = 2;

/// A person renting a unit, identified by national id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tenant {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
}

impl Tenant {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            national_id: national_id.into(),
        }
    }

    /// Parses `firstName,lastName,nationalId`; any other field count yields None
    pub fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        match fields.as_slice() {
            [first, last, id] => Some(Tenant::new(first.trim(), last.trim(), id.trim())),
            _ => None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (DNI: {})", self.first_name, self.last_name, self.national_id)
    }
}

/// Raw parking-spot record as stored: `number,category,paidFlag,tenantNationalId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotRecord {
    pub number: u32,
    pub category: String,
    pub paid: bool,
    pub tenant_id: String,
}

impl SpotRecord {
    /// Parses a 4-field line; wrong field count or a non-numeric number yields None
    pub fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        let [number, category, paid, tenant_id] = fields.as_slice() else {
            return None;
        };
        Some(Self {
            number: number.trim().parse().ok()?,
            category: category.trim().to_string(),
            paid: paid.trim().eq_ignore_ascii_case("true"),
            tenant_id: tenant_id.trim().to_string(),
        })
    }
}

/// Who a parking spot belongs to, as resolved at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotHolder {
    Resolved(Tenant),
    /// The stored national id matched no loaded tenant
    Unresolved(String),
}

/// A numbered parking space assigned to one tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingSpot {
    pub number: u32,
    pub category: String,
    pub paid: bool,
    pub holder: SpotHolder,
}

impl ParkingSpot {
    pub fn tenant(&self) -> Option<&Tenant> {
        match &self.holder {
            SpotHolder::Resolved(tenant) => Some(tenant),
            SpotHolder::Unresolved(_) => None,
        }
    }

    pub fn tenant_id(&self) -> &str {
        match &self.holder {
            SpotHolder::Resolved(tenant) => &tenant.national_id,
            SpotHolder::Unresolved(id) => id,
        }
    }

    pub fn payment_status(&self) -> &'static str {
        if self.paid {
            "Pagado"
        } else {
            "Pendiente"
        }
    }
}

impl fmt::Display for ParkingSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cochera N°{} | Categoría: {} | Estado de pago: {}",
            self.number,
            self.category,
            self.payment_status()
        )?;
        match &self.holder {
            SpotHolder::Resolved(tenant) => write!(f, " | Inquilino: {}", tenant),
            SpotHolder::Unresolved(id) => write!(f, " | Inquilino desconocido (DNI: {})", id),
        }
    }
}

/// A payment made by a tenant for their parking spot
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub amount: f64,
    /// dd/mm/yyyy
    pub date: String,
    pub tenant: Tenant,
    pub spot_number: u32,
}

impl Payment {
    pub fn new(amount: f64, date: impl Into<String>, tenant: Tenant, spot_number: u32) -> DomainResult<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DomainError::InvalidAmount(amount));
        }
        Ok(Self {
            amount,
            date: date.into(),
            tenant,
            spot_number,
        })
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pago por : ${:.2} | Fecha: {} | Inquilino: {}",
            self.amount,
            self.date,
            self.tenant.full_name()
        )
    }
}

/// Shared amenities that can be reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    Grill,
    Hall,
    Pool,
}

impl Place {
    pub fn all() -> &'static [Place] {
        &[Place::Grill, Place::Hall, Place::Pool]
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Grill => write!(f, "GRILL"),
            Place::Hall => write!(f, "HALL"),
            Place::Pool => write!(f, "POOL"),
        }
    }
}

impl FromStr for Place {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GRILL" | "PARRILLA" => Ok(Place::Grill),
            "HALL" | "SUM" => Ok(Place::Hall),
            "POOL" | "PILETA" => Ok(Place::Pool),
            _ => Err(DomainError::UnknownPlace(s.to_string())),
        }
    }
}

/// A booking of a shared amenity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub number: u32,
    pub date: String,
    pub tenant: Tenant,
    pub place: Place,
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} | Fecha: {} | Lugar: {} | Inquilino: {}",
            RESERVATION_PREFIX,
            self.number,
            self.date,
            self.place,
            self.tenant.full_name()
        )
    }
}

/// Extracts `<n>` from a line starting with `Reserva N°<n> |`
pub fn parse_reservation_number(line: &str) -> Option<u32> {
    let rest = line.strip_prefix(RESERVATION_PREFIX)?;
    let token = rest.split('|').next()?;
    token.trim().parse().ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a dd/mm/yyyy reservation date, rejecting dates before `today`
pub fn validate_reservation_date(input: &str, today: NaiveDate) -> DomainResult<NaiveDate> {
    let input = input.trim();
    let date = NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(input.to_string()))?;
    if date < today {
        return Err(DomainError::DateInPast(input.to_string()));
    }
    Ok(date)
}
