//! Mapping between wire DTOs and engine types.

use api_types::{
    FuelType as ApiFuelType, RequiredLicence as ApiLicence, Role as ApiRole,
    address::AddressDto,
    car::{CarCreate, CarGet, CarStatus as ApiCarStatus, CarUpdate},
    depot::{DepotCreate, DepotGet, DepotUpdate},
    receipt::ReceiptGet,
    rent::{RentGet, RentStatus as ApiRentStatus},
    stats,
    user::{GuestCreate, UserGet, UserRegister, UserUpdate},
    waiting_list::{WaitingListEntryGet, WaitingListStatus as ApiWaitingStatus},
};
use engine::{
    Address, AddressInput, Car, CarInput, CarPatch, CarStatus, Depot, DepotInput, DepotPatch,
    FuelType, GuestInput, Receipt, Rent, RentStatus, RequiredLicence, Role, Statistics, User,
    UserPatch, UserRegistration, WaitingListEntry, WaitingListStatus,
};

pub fn fuel_type_to_api(value: FuelType) -> ApiFuelType {
    match value {
        FuelType::Diesel => ApiFuelType::Diesel,
        FuelType::Petrol => ApiFuelType::Petrol,
        FuelType::Hybrid => ApiFuelType::Hybrid,
        FuelType::Electric => ApiFuelType::Electric,
    }
}

pub fn fuel_type_from_api(value: ApiFuelType) -> FuelType {
    match value {
        ApiFuelType::Diesel => FuelType::Diesel,
        ApiFuelType::Petrol => FuelType::Petrol,
        ApiFuelType::Hybrid => FuelType::Hybrid,
        ApiFuelType::Electric => FuelType::Electric,
    }
}

pub fn licence_to_api(value: RequiredLicence) -> ApiLicence {
    match value {
        RequiredLicence::Am => ApiLicence::Am,
        RequiredLicence::A1 => ApiLicence::A1,
        RequiredLicence::A2 => ApiLicence::A2,
        RequiredLicence::A => ApiLicence::A,
        RequiredLicence::B => ApiLicence::B,
    }
}

pub fn licence_from_api(value: ApiLicence) -> RequiredLicence {
    match value {
        ApiLicence::Am => RequiredLicence::Am,
        ApiLicence::A1 => RequiredLicence::A1,
        ApiLicence::A2 => RequiredLicence::A2,
        ApiLicence::A => RequiredLicence::A,
        ApiLicence::B => RequiredLicence::B,
    }
}

pub fn role_to_api(value: Role) -> ApiRole {
    match value {
        Role::Renter => ApiRole::Renter,
        Role::Staff => ApiRole::Staff,
        Role::Admin => ApiRole::Admin,
    }
}

pub fn role_from_api(value: ApiRole) -> Role {
    match value {
        ApiRole::Renter => Role::Renter,
        ApiRole::Staff => Role::Staff,
        ApiRole::Admin => Role::Admin,
    }
}

fn car_status_to_api(value: CarStatus) -> ApiCarStatus {
    match value {
        CarStatus::Available => ApiCarStatus::Available,
        CarStatus::Rented => ApiCarStatus::Rented,
        CarStatus::Deleted => ApiCarStatus::Deleted,
    }
}

fn rent_status_to_api(value: RentStatus) -> ApiRentStatus {
    match value {
        RentStatus::Pending => ApiRentStatus::Pending,
        RentStatus::Approved => ApiRentStatus::Approved,
        RentStatus::Rejected => ApiRentStatus::Rejected,
        RentStatus::HandedOver => ApiRentStatus::HandedOver,
        RentStatus::Returned => ApiRentStatus::Returned,
        RentStatus::Invoiced => ApiRentStatus::Invoiced,
    }
}

pub fn rent_status_from_api(value: ApiRentStatus) -> RentStatus {
    match value {
        ApiRentStatus::Pending => RentStatus::Pending,
        ApiRentStatus::Approved => RentStatus::Approved,
        ApiRentStatus::Rejected => RentStatus::Rejected,
        ApiRentStatus::HandedOver => RentStatus::HandedOver,
        ApiRentStatus::Returned => RentStatus::Returned,
        ApiRentStatus::Invoiced => RentStatus::Invoiced,
    }
}

fn waiting_status_to_api(value: WaitingListStatus) -> ApiWaitingStatus {
    match value {
        WaitingListStatus::Active => ApiWaitingStatus::Active,
        WaitingListStatus::Notified => ApiWaitingStatus::Notified,
        WaitingListStatus::Booked => ApiWaitingStatus::Booked,
        WaitingListStatus::Canceled => ApiWaitingStatus::Canceled,
    }
}

pub fn address_to_api(address: &Address) -> AddressDto {
    AddressDto {
        zip: address.zip.clone(),
        city: address.city.clone(),
        street: address.street.clone(),
        house_number: address.house_number.clone(),
    }
}

pub fn address_input(dto: AddressDto) -> AddressInput {
    AddressInput {
        zip: dto.zip,
        city: dto.city,
        street: dto.street,
        house_number: dto.house_number,
    }
}

pub fn car_to_api(car: &Car) -> CarGet {
    CarGet {
        id: car.id,
        brand: car.brand.clone(),
        model: car.model.clone(),
        fuel_type: fuel_type_to_api(car.fuel_type),
        required_licence: licence_to_api(car.required_licence),
        licence_plate: car.licence_plate.clone(),
        has_valid_vignette: car.has_valid_vignette,
        price_per_kilometer: car.price_per_kilometer.cents(),
        is_automatic: car.is_automatic,
        actual_kilometers: car.actual_kilometers,
        in_proper_condition: car.in_proper_condition,
        depot_id: car.depot_id,
        status: car_status_to_api(car.status),
    }
}

pub fn car_input(dto: CarCreate) -> CarInput {
    CarInput {
        brand: dto.brand,
        model: dto.model,
        fuel_type: fuel_type_from_api(dto.fuel_type),
        required_licence: licence_from_api(dto.required_licence),
        licence_plate: dto.licence_plate,
        has_valid_vignette: dto.has_valid_vignette,
        price_per_kilometer: dto.price_per_kilometer,
        is_automatic: dto.is_automatic,
        actual_kilometers: dto.actual_kilometers,
        in_proper_condition: dto.in_proper_condition,
        depot_id: dto.depot_id,
    }
}

pub fn car_patch(dto: CarUpdate) -> CarPatch {
    CarPatch {
        brand: dto.brand,
        model: dto.model,
        fuel_type: dto.fuel_type.map(fuel_type_from_api),
        required_licence: dto.required_licence.map(licence_from_api),
        licence_plate: dto.licence_plate,
        has_valid_vignette: dto.has_valid_vignette,
        price_per_kilometer: dto.price_per_kilometer,
        is_automatic: dto.is_automatic,
        actual_kilometers: dto.actual_kilometers,
        in_proper_condition: dto.in_proper_condition,
        depot_id: dto.depot_id,
    }
}

pub fn user_to_api(user: &User) -> UserGet {
    UserGet {
        id: user.id,
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        phone_number: user.phone_number.clone(),
        licence_id: user.licence_id.clone(),
        address: user.address.as_ref().map(address_to_api),
        role: role_to_api(user.role),
        registered: user.registered,
    }
}

pub fn registration(dto: UserRegister) -> UserRegistration {
    UserRegistration {
        name: dto.name,
        username: dto.username,
        email: dto.email,
        password: dto.password,
        phone_number: dto.phone_number,
        licence_id: dto.licence_id,
        address: dto.address.map(address_input),
    }
}

pub fn guest_input(dto: GuestCreate) -> GuestInput {
    GuestInput {
        name: dto.name,
        email: dto.email,
        phone_number: dto.phone_number,
        licence_id: dto.licence_id,
        address: dto.address.map(address_input),
    }
}

pub fn user_patch(dto: UserUpdate) -> UserPatch {
    UserPatch {
        name: dto.name,
        email: dto.email,
        password: dto.password,
        phone_number: dto.phone_number,
        licence_id: dto.licence_id,
        address: dto.address.map(address_input),
    }
}

pub fn depot_to_api(depot: &Depot) -> DepotGet {
    DepotGet {
        id: depot.id,
        name: depot.name.clone(),
        address: address_to_api(&depot.address),
    }
}

pub fn depot_input(dto: DepotCreate) -> DepotInput {
    DepotInput {
        name: dto.name,
        address: address_input(dto.address),
    }
}

pub fn depot_patch(dto: DepotUpdate) -> DepotPatch {
    DepotPatch {
        name: dto.name,
        address: dto.address.map(address_input),
    }
}

pub fn rent_to_api(rent: &Rent) -> RentGet {
    RentGet {
        id: rent.id,
        renter_id: rent.renter_id,
        car_id: rent.car_id,
        status: rent_status_to_api(rent.status),
        planned_start: rent.planned_start,
        planned_end: rent.planned_end,
        actual_start: rent.actual_start,
        actual_end: rent.actual_end,
        starting_kilometer: rent.starting_kilometer,
        ending_kilometer: rent.ending_kilometer,
        approver_id: rent.approver_id,
        issuer_id: rent.issuer_id,
        recipient_id: rent.recipient_id,
        rejection_reason: rent.rejection_reason.clone(),
        invoice_request: rent.invoice_request,
        issued_at: rent.issued_at,
    }
}

pub fn receipt_to_api(receipt: &Receipt) -> ReceiptGet {
    ReceiptGet {
        id: receipt.id,
        rent_id: receipt.rent_id,
        total_cost: receipt.total_cost.cents(),
        issue_date: receipt.issue_date,
        issuer_id: receipt.issuer_id,
    }
}

pub fn entry_to_api(entry: &WaitingListEntry) -> WaitingListEntryGet {
    WaitingListEntryGet {
        id: entry.id,
        car_id: entry.car_id,
        user_id: entry.user_id,
        queue_position: entry.queue_position,
        status: waiting_status_to_api(entry.status),
        created_at: entry.created_at,
        notified_at: entry.notified_at,
        updated_at: entry.updated_at,
    }
}

pub fn statistics_to_api(value: &Statistics) -> stats::Statistics {
    stats::Statistics {
        cars_total: value.cars_total,
        cars_available: value.cars_available,
        cars_rented: value.cars_rented,
        cars_deleted: value.cars_deleted,
        rents_pending: value.rents_pending,
        rents_approved: value.rents_approved,
        rents_rejected: value.rents_rejected,
        rents_handed_over: value.rents_handed_over,
        rents_returned: value.rents_returned,
        rents_invoiced: value.rents_invoiced,
        waiting_list_open: value.waiting_list_open,
        revenue_total: value.revenue_total.cents(),
        kilometers_driven: value.kilometers_driven,
    }
}
