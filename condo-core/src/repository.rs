//! In-memory view of tenants and parking spots over the record stores
//!
//! The repository loads tenants and parking spots once at startup, keeps the
//! payments and reservations registered during the session, and delegates all
//! persistence to [`RecordStore`].

use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashSet;

use crate::config::DataPaths;
use crate::error::{DomainError, DomainResult, StoreError, StoreResult};
use crate::models::{
    format_date, parse_reservation_number, ParkingSpot, Payment, Place, Reservation, SpotHolder,
    SpotRecord, Tenant, PAID_FIELD_INDEX,
};
use crate::storage::RecordStore;

pub struct Repository {
    tenants: Vec<Tenant>,
    spots: Vec<ParkingSpot>,
    payments: Vec<Payment>,
    reservations: Vec<Reservation>,
    next_reservation_number: u32,

    tenant_store: RecordStore,
    spot_store: RecordStore,
    payment_log: RecordStore,
    reservation_log: RecordStore,
}

impl Repository {
    /// Creates an empty repository over the given store files
    pub fn new(paths: &DataPaths) -> Self {
        Self {
            tenants: Vec::new(),
            spots: Vec::new(),
            payments: Vec::new(),
            reservations: Vec::new(),
            next_reservation_number: 1,
            tenant_store: RecordStore::new(&paths.tenants),
            spot_store: RecordStore::new(&paths.parking_spots),
            payment_log: RecordStore::new(&paths.payments),
            reservation_log: RecordStore::new(&paths.reservations),
        }
    }

    /// Creates a repository and loads everything it can.
    ///
    /// Returns the load failures alongside it; a store that could not be read
    /// simply contributes nothing.
    pub fn open(paths: &DataPaths) -> (Self, Vec<StoreError>) {
        let mut repo = Self::new(paths);
        let mut errors = Vec::new();

        if let Err(e) = repo.load_tenants() {
            errors.push(e);
        }
        if let Err(e) = repo.load_parking_spots() {
            errors.push(e);
        }
        if let Err(e) = repo.load_reservation_sequence() {
            errors.push(e);
        }

        (repo, errors)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads tenants from the tenant store, returning how many were loaded
    pub fn load_tenants(&mut self) -> StoreResult<usize> {
        let mut tenants: Vec<Tenant> = Vec::new();

        for line in self.tenant_store.read_all()? {
            let line = line?;
            let Some(tenant) = Tenant::from_line(&line) else {
                debug!("Skipping tenant line {:?}", line);
                continue;
            };
            if tenants.iter().any(|t| t.national_id == tenant.national_id) {
                warn!("Duplicate tenant national id {}, keeping the first", tenant.national_id);
                continue;
            }
            tenants.push(tenant);
        }

        debug!("Loaded {} tenants", tenants.len());
        self.tenants = tenants;
        Ok(self.tenants.len())
    }

    /// Replaces the parking-spot set with the content of the spot store.
    ///
    /// Spots referencing an unknown tenant are kept as unresolved. Returns the
    /// number of spots with a resolved tenant.
    pub fn load_parking_spots(&mut self) -> StoreResult<usize> {
        let mut spots: Vec<ParkingSpot> = Vec::new();
        let mut numbers = HashSet::new();

        for line in self.spot_store.read_all()? {
            let line = line?;
            let Some(record) = SpotRecord::from_line(&line) else {
                debug!("Skipping parking spot line {:?}", line);
                continue;
            };
            if !numbers.insert(record.number) {
                warn!("Duplicate parking spot number {}, keeping the first", record.number);
                continue;
            }

            let holder = match self.find_tenant_by_national_id(&record.tenant_id) {
                Some(tenant) => SpotHolder::Resolved(tenant.clone()),
                None => {
                    warn!(
                        "Parking spot {} references unknown tenant {}",
                        record.number, record.tenant_id
                    );
                    SpotHolder::Unresolved(record.tenant_id)
                }
            };

            spots.push(ParkingSpot {
                number: record.number,
                category: record.category,
                paid: record.paid,
                holder,
            });
        }

        self.spots = spots;
        let resolved = self.parking_spots().count();
        debug!("Loaded {} parking spots ({} resolved)", self.spots.len(), resolved);
        Ok(resolved)
    }

    /// Seeds the reservation counter from the highest number in the log
    pub fn load_reservation_sequence(&mut self) -> StoreResult<u32> {
        let lines = match self.reservation_log.read_all() {
            Ok(lines) => lines,
            Err(StoreError::NotFound { .. }) => {
                self.next_reservation_number = 1;
                return Ok(self.next_reservation_number);
            }
            Err(e) => return Err(e),
        };

        let mut max: u32 = 0;
        for line in lines {
            let line = line?;
            match parse_reservation_number(&line) {
                Some(u32::MAX) => warn!("Ignoring out of range reservation line {:?}", line),
                Some(number) => max = max.max(number),
                None => warn!("Ignoring unparsable reservation line {:?}", line),
            }
        }

        // max < u32::MAX here
        self.next_reservation_number = max + 1;
        Ok(self.next_reservation_number)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    /// Parking spots whose tenant was resolved at load time
    pub fn parking_spots(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter().filter(|s| s.tenant().is_some())
    }

    /// Parking spots whose tenant id matched no loaded tenant
    pub fn unresolved_spots(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter().filter(|s| s.tenant().is_none())
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn next_reservation_number(&self) -> u32 {
        self.next_reservation_number
    }

    pub fn payment_log(&self) -> &RecordStore {
        &self.payment_log
    }

    pub fn reservation_log(&self) -> &RecordStore {
        &self.reservation_log
    }

    pub fn find_tenant_by_national_id(&self, national_id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.national_id == national_id)
    }

    pub fn find_parking_spot_by_tenant(&self, tenant: &Tenant) -> Option<&ParkingSpot> {
        self.parking_spots()
            .find(|s| s.tenant().is_some_and(|t| t.national_id == tenant.national_id))
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Builds a payment for the tenant's parking spot
    pub fn new_payment(&self, tenant: &Tenant, amount: f64, date: NaiveDate) -> DomainResult<Payment> {
        let spot = self
            .find_parking_spot_by_tenant(tenant)
            .ok_or_else(|| DomainError::NoParkingSpot {
                tenant: tenant.full_name(),
            })?;

        Payment::new(amount, format_date(date), tenant.clone(), spot.number)
    }

    /// Records a payment, marks its spot as paid and reloads the spots
    pub fn register_payment(&mut self, payment: Payment) -> DomainResult<()> {
        let line = payment.to_string();
        let spot_number = payment.spot_number;
        self.payments.push(payment);

        self.payment_log.append(&line)?;
        self.spot_store
            .update_field(spot_number, PAID_FIELD_INDEX, "true")?;
        self.load_parking_spots()?;

        debug!("Registered payment for parking spot {}", spot_number);
        Ok(())
    }

    // =========================================================================
    // Reservations
    // =========================================================================

    /// Builds a reservation with the next number in sequence
    pub fn new_reservation(
        &mut self,
        date: NaiveDate,
        tenant: &Tenant,
        place: Place,
    ) -> DomainResult<Reservation> {
        let number = self.next_reservation_number;
        self.next_reservation_number = number
            .checked_add(1)
            .ok_or(DomainError::ReservationNumbersExhausted)?;

        Ok(Reservation {
            number,
            date: format_date(date),
            tenant: tenant.clone(),
            place,
        })
    }

    pub fn register_reservation(&mut self, reservation: Reservation) -> StoreResult<()> {
        let line = reservation.to_string();
        self.reservations.push(reservation);
        self.reservation_log.append(&line)
    }

    /// Removes a reservation from the log and from memory
    pub fn cancel_reservation(&mut self, number: u32) -> DomainResult<()> {
        let removed = self
            .reservation_log
            .retain(|line| parse_reservation_number(line) != Some(number))?;

        if removed == 0 {
            return Err(DomainError::ReservationNotFound(number));
        }

        self.reservations.retain(|r| r.number != number);

        debug!("Cancelled reservation {}", number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn date(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(tenants: &str, spots: &str) -> (TempDir, DataPaths) {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::in_dir(dir.path());
        fs::write(&paths.tenants, tenants).unwrap();
        fs::write(&paths.parking_spots, spots).unwrap();
        (dir, paths)
    }

    fn reservation_numbers(repo: &Repository) -> Vec<u32> {
        repo.reservation_log()
            .read_lines()
            .unwrap()
            .iter()
            .filter_map(|l| parse_reservation_number(l))
            .collect()
    }

    #[test]
    fn test_load_tenants_skips_wrong_field_counts() {
        let (_dir, paths) = setup(
            "Ana,Gomez,111\nsolo,dos\nLuis,Diaz,222\nx,y,z,w\n",
            "",
        );
        let mut repo = Repository::new(&paths);

        assert_eq!(repo.load_tenants().unwrap(), 2);
        let ids: Vec<&str> = repo.tenants().iter().map(|t| t.national_id.as_str()).collect();
        assert_eq!(ids, vec!["111", "222"]);
    }

    #[test]
    fn test_load_parking_spots_resolves_tenants() {
        let (_dir, paths) = setup(
            "Ana,Gomez,111\nLuis,Diaz,222\n",
            "1,Cubierta,false,111\n2,Descubierta,true,999\nbad line\n3,Moto,true,222\n",
        );
        let (repo, errors) = Repository::open(&paths);

        assert!(errors.is_empty());
        let numbers: Vec<u32> = repo.parking_spots().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 3]);

        let unresolved: Vec<&ParkingSpot> = repo.unresolved_spots().collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].tenant_id(), "999");
    }

    #[test]
    fn test_open_with_missing_files_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::in_dir(dir.path());

        let (repo, errors) = Repository::open(&paths);

        assert_eq!(errors.len(), 2);
        assert!(repo.tenants().is_empty());
        assert_eq!(repo.parking_spots().count(), 0);
        assert_eq!(repo.next_reservation_number(), 1);
    }

    #[test]
    fn test_lookups() {
        let (_dir, paths) = setup("Ana,Gomez,111\nLuis,Diaz,222\n", "5,Cubierta,false,222\n");
        let (repo, _) = Repository::open(&paths);

        let luis = repo.find_tenant_by_national_id("222").unwrap().clone();
        assert_eq!(luis.first_name, "Luis");
        assert_eq!(repo.find_parking_spot_by_tenant(&luis).unwrap().number, 5);

        let ana = repo.find_tenant_by_national_id("111").unwrap();
        assert!(repo.find_parking_spot_by_tenant(ana).is_none());
        assert!(repo.find_tenant_by_national_id("333").is_none());
    }

    #[test]
    fn test_register_payment_marks_spot_paid() {
        let (_dir, paths) = setup(
            "Ana,Gomez,111\nLuis,Diaz,222\n",
            "1,Cubierta,false,111\n2,Descubierta,false,222\n",
        );
        let (mut repo, _) = Repository::open(&paths);
        let ana = repo.find_tenant_by_national_id("111").unwrap().clone();

        let payment = repo.new_payment(&ana, 1500.0, date(5, 3, 2024)).unwrap();
        repo.register_payment(payment).unwrap();

        assert_eq!(
            repo.payment_log().read_lines().unwrap(),
            vec!["Pago por : $1500.00 | Fecha: 05/03/2024 | Inquilino: Ana Gomez"]
        );
        assert_eq!(
            fs::read_to_string(&paths.parking_spots).unwrap(),
            "1,Cubierta,true,111\n2,Descubierta,false,222\n"
        );
        assert!(repo.find_parking_spot_by_tenant(&ana).unwrap().paid);
        assert_eq!(repo.payments().len(), 1);

        let mut reloaded = Repository::new(&paths);
        reloaded.load_tenants().unwrap();
        reloaded.load_parking_spots().unwrap();
        assert!(reloaded.find_parking_spot_by_tenant(&ana).unwrap().paid);
    }

    #[test]
    fn test_payment_without_parking_spot_is_rejected() {
        let (_dir, paths) = setup("Ana,Gomez,111\nLuis,Diaz,222\n", "1,Cubierta,false,111\n");
        let spots_before = fs::read_to_string(&paths.parking_spots).unwrap();
        let (repo, _) = Repository::open(&paths);
        let luis = repo.find_tenant_by_national_id("222").unwrap().clone();

        let err = repo.new_payment(&luis, 100.0, date(1, 1, 2024)).unwrap_err();

        assert!(matches!(err, DomainError::NoParkingSpot { .. }));
        assert!(!paths.payments.exists());
        assert_eq!(fs::read_to_string(&paths.parking_spots).unwrap(), spots_before);
    }

    #[test]
    fn test_reservation_numbering_uses_max_of_log() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        fs::write(
            &paths.reservations,
            "Reserva N°5 | Fecha: 01/01/2030 | Lugar: POOL | Inquilino: Ana Gomez\n\
             Reserva N°1 | Fecha: 01/01/2030 | Lugar: HALL | Inquilino: Ana Gomez\n\
             garbage\n\
             Reserva N°3 | Fecha: 01/01/2030 | Lugar: GRILL | Inquilino: Ana Gomez\n",
        )
        .unwrap();
        let (mut repo, _) = Repository::open(&paths);
        let ana = repo.tenants()[0].clone();

        let first = repo.new_reservation(date(1, 2, 2030), &ana, Place::Grill).unwrap();
        let second = repo.new_reservation(date(2, 2, 2030), &ana, Place::Hall).unwrap();

        assert_eq!(first.number, 6);
        assert_eq!(second.number, 7);
    }

    #[test]
    fn test_loaders_accept_latin1_lines() {
        let (_dir, paths) = setup("", "");
        fs::write(&paths.tenants, b"Ana,Gomez,111\nJos\xe9,Mu\xf1oz,222\nLuis,Diaz,333\n").unwrap();
        fs::write(&paths.parking_spots, b"1,Peque\xf1a,false,222\n2,Cubierta,true,333\n").unwrap();
        fs::write(
            &paths.reservations,
            b"Reserva N\xc2\xb07 | Fecha: 01/01/2030 | Lugar: POOL | Inquilino: Ana Gomez\n\
              Reserva N\xb09 | Fecha: 02/01/2030 | Lugar: HALL | Inquilino: Jos\xe9 Mu\xf1oz\n",
        )
        .unwrap();

        let (mut repo, errors) = Repository::open(&paths);

        assert!(errors.is_empty());
        assert_eq!(repo.tenants().len(), 3);
        assert_eq!(repo.tenants()[1].last_name, "Muñoz");
        assert_eq!(repo.parking_spots().count(), 2);
        assert_eq!(repo.next_reservation_number(), 10);

        let jose = repo.tenants()[1].clone();
        let payment = repo.new_payment(&jose, 800.0, date(1, 2, 2030)).unwrap();
        repo.register_payment(payment).unwrap();
        assert_eq!(
            fs::read(&paths.parking_spots).unwrap(),
            b"1,Peque\xf1a,true,222\n2,Cubierta,true,333\n".to_vec()
        );

        repo.cancel_reservation(9).unwrap();
        assert_eq!(reservation_numbers(&repo), vec![7]);
    }

    #[test]
    fn test_reservation_numbering_at_u32_limit() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        fs::write(
            &paths.reservations,
            format!(
                "Reserva N°{} | Fecha: x\nReserva N°{} | Fecha: y\n",
                u32::MAX,
                u32::MAX - 2
            ),
        )
        .unwrap();

        let (mut repo, errors) = Repository::open(&paths);
        assert!(errors.is_empty());
        assert_eq!(repo.next_reservation_number(), u32::MAX - 1);

        let ana = repo.tenants()[0].clone();
        let last = repo.new_reservation(date(1, 1, 2030), &ana, Place::Grill).unwrap();
        assert_eq!(last.number, u32::MAX - 1);
        assert!(matches!(
            repo.new_reservation(date(1, 1, 2030), &ana, Place::Grill),
            Err(DomainError::ReservationNumbersExhausted)
        ));
    }

    #[test]
    fn test_register_reservation_appends_to_log() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        let (mut repo, _) = Repository::open(&paths);
        let ana = repo.tenants()[0].clone();

        let reservation = repo.new_reservation(date(15, 6, 2030), &ana, Place::Pool).unwrap();
        repo.register_reservation(reservation).unwrap();

        assert_eq!(
            repo.reservation_log().read_lines().unwrap(),
            vec!["Reserva N°1 | Fecha: 15/06/2030 | Lugar: POOL | Inquilino: Ana Gomez"]
        );
        assert_eq!(repo.reservations().len(), 1);
    }

    #[test]
    fn test_cancel_reservation() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        let (mut repo, _) = Repository::open(&paths);
        let ana = repo.tenants()[0].clone();

        for day in 1..=5 {
            let reservation = repo.new_reservation(date(day, 1, 2030), &ana, Place::Hall).unwrap();
            repo.register_reservation(reservation).unwrap();
        }
        repo.cancel_reservation(2).unwrap();
        repo.cancel_reservation(4).unwrap();
        assert_eq!(reservation_numbers(&repo), vec![1, 3, 5]);

        repo.cancel_reservation(3).unwrap();
        assert_eq!(reservation_numbers(&repo), vec![1, 5]);
        let in_memory: Vec<u32> = repo.reservations().iter().map(|r| r.number).collect();
        assert_eq!(in_memory, vec![1, 5]);
    }

    #[test]
    fn test_cancel_unknown_reservation_leaves_log() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        let content = "Reserva N°1 | Fecha: a\nReserva N°3 | Fecha: b\nReserva N°5 | Fecha: c\n";
        fs::write(&paths.reservations, content).unwrap();
        let (mut repo, _) = Repository::open(&paths);

        let err = repo.cancel_reservation(99).unwrap_err();

        assert!(matches!(err, DomainError::ReservationNotFound(99)));
        assert_eq!(fs::read_to_string(&paths.reservations).unwrap(), content);
    }

    #[test]
    fn test_cancel_does_not_match_number_prefix() {
        let (_dir, paths) = setup("Ana,Gomez,111\n", "");
        fs::write(&paths.reservations, "Reserva N°12 | Fecha: a\n").unwrap();
        let (mut repo, _) = Repository::open(&paths);

        assert!(repo.cancel_reservation(1).is_err());
        assert_eq!(reservation_numbers(&repo), vec![12]);
    }
}
