//! Booking records: schema and test payload generation

use chrono::{Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schema::{RecordSchema, SchemaBuilder};
use crate::types::{FieldSpec, Format, Invariant};

/// Wire format of booking dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const ADDITIONAL_NEEDS: [&str; 5] = ["Breakfast", "Lunch", "Dinner", "Baby crib", "Late checkout"];

const FIRST_NAMES: [&str; 16] = [
    "Jane", "John", "Amara", "Lukas", "Mei", "Diego", "Priya", "Oskar", "Fatima", "Noah", "Ingrid",
    "Kenji", "Zanele", "Mateo", "Elif", "Aiden",
];

const LAST_NAMES: [&str; 16] = [
    "Doe", "Okafor", "Schmidt", "Chen", "Garcia", "Patel", "Lindqvist", "Haddad", "Murphy",
    "Novak", "Tanaka", "Dlamini", "Rossi", "Yilmaz", "Kowalski", "Moreau",
];

static SCHEMA: Lazy<RecordSchema> = Lazy::new(|| {
    booking_fields(RecordSchema::builder("booking"))
        .build()
        .expect("booking schema is well-formed")
});

static STRICT_SCHEMA: Lazy<RecordSchema> = Lazy::new(|| {
    booking_fields(RecordSchema::builder("booking-strict"))
        .invariant(Invariant::DateOrder {
            earlier: "bookingdates.checkin".to_string(),
            later: "bookingdates.checkout".to_string(),
        })
        .build()
        .expect("strict booking schema is well-formed")
});

fn booking_fields(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .field(FieldSpec::string("firstname").min_length(1))
        .field(FieldSpec::string("lastname").min_length(1))
        .field(FieldSpec::number("totalprice").minimum(0.0))
        .field(FieldSpec::boolean("depositpaid"))
        .field(
            FieldSpec::object("bookingdates")
                .child(FieldSpec::string("checkin").with_format(Format::Date))
                .child(FieldSpec::string("checkout").with_format(Format::Date)),
        )
        .field(FieldSpec::string("additionalneeds").optional())
}

/// Schema of a booking record as returned by the booking API
pub fn schema() -> &'static RecordSchema {
    &SCHEMA
}

/// [`schema`] plus the requirement that checkout is not before checkin
pub fn strict_schema() -> &'static RecordSchema {
    &STRICT_SCHEMA
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDates {
    pub checkin: String,
    pub checkout: String,
}

/// Request body for creating or replacing a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: i64,
    pub depositpaid: bool,
    pub bookingdates: BookingDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

impl BookingPayload {
    /// Random booking starting within 30 days after `today`, lasting 1-5 nights
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Self {
        let checkin = today + Duration::days(rng.gen_range(1..=30));
        let checkout = checkin + Duration::days(rng.gen_range(1..=5));

        Self {
            firstname: FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_string(),
            lastname: LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())].to_string(),
            totalprice: rng.gen_range(50..=500),
            depositpaid: rng.gen_bool(0.5),
            bookingdates: BookingDates {
                checkin: checkin.format(DATE_FORMAT).to_string(),
                checkout: checkout.format(DATE_FORMAT).to_string(),
            },
            additionalneeds: Some(
                ADDITIONAL_NEEDS[rng.gen_range(0..ADDITIONAL_NEEDS.len())].to_string(),
            ),
        }
    }

    /// Random booking relative to the current UTC date
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng(), Utc::now().date_naive())
    }

    /// Random booking whose first name differs from `other`'s
    pub fn random_unlike<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate, other: &Self) -> Self {
        let mut payload = Self::generate(rng, today);
        if payload.firstname == other.firstname {
            let index = FIRST_NAMES
                .iter()
                .position(|n| *n == payload.firstname)
                .unwrap_or(0);
            payload.firstname = FIRST_NAMES[(index + 1) % FIRST_NAMES.len()].to_string();
        }
        payload
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "firstname": self.firstname,
            "lastname": self.lastname,
            "totalprice": self.totalprice,
            "depositpaid": self.depositpaid,
            "bookingdates": {
                "checkin": self.bookingdates.checkin,
                "checkout": self.bookingdates.checkout,
            },
        });
        if let (Some(needs), Some(map)) = (&self.additionalneeds, value.as_object_mut()) {
            map.insert("additionalneeds".to_string(), json!(needs));
        }
        value
    }
}
