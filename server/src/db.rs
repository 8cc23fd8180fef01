//! Typed access to the document store.

use anyhow::{Context, Result};
use mongodb::{Client, Collection, Database};

use crate::models::appointment::Appointment;
use crate::models::medicine::Medicine;
use crate::models::prescription::Prescription;
use crate::models::profile::{Doctor, Patient};
use crate::models::user::User;

/// Cheaply cloneable handle; the driver pools connections internally.
#[derive(Clone)]
pub struct Db {
    database: Database,
}

impl Db {
    pub async fn connect(uri: &str, name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("connecting to MongoDB")?;
        Ok(Self {
            database: client.database(name),
        })
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub fn doctors(&self) -> Collection<Doctor> {
        self.database.collection("doctors")
    }

    pub fn patients(&self) -> Collection<Patient> {
        self.database.collection("patients")
    }

    pub fn appointments(&self) -> Collection<Appointment> {
        self.database.collection("appointments")
    }

    pub fn prescriptions(&self) -> Collection<Prescription> {
        self.database.collection("prescriptions")
    }

    pub fn medicines(&self) -> Collection<Medicine> {
        self.database.collection("medicines")
    }
}
