//! Client CRUD with NIP uniqueness and delete restriction.

use chrono::Utc;
use tracing::info;

use crate::core::validate::{
    normalize_nip, optional_text, required_text, validate_email, MAX_NAME_LEN,
};
use crate::core::{Client, ClientPatch, Error, NewClient};
use crate::db::{self, Database};

/// Accessor view over the client table.
pub struct ClientService<'a> {
    db: &'a Database,
}

impl<'a> ClientService<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, input: NewClient) -> Result<Client, Error> {
        let now = Utc::now();
        let client = Client {
            id: 0,
            name: required_text("name", &input.name, MAX_NAME_LEN)?,
            nip: normalize_nip("nip", &input.nip)?,
            address: optional_text("address", input.address.as_deref(), MAX_NAME_LEN)?,
            city: optional_text("city", input.city.as_deref(), MAX_NAME_LEN)?,
            postal_code: optional_text("postal_code", input.postal_code.as_deref(), 16)?,
            email: match optional_text("email", input.email.as_deref(), MAX_NAME_LEN)? {
                Some(email) => Some(validate_email("email", &email)?),
                None => None,
            },
            phone: optional_text("phone", input.phone.as_deref(), 32)?,
            created_at: now,
            updated_at: now,
        };

        let client = self.db.with_tx(|tx| {
            let id = match db::clients::insert(tx, &client) {
                Err(Error::Conflict(_)) => {
                    return Err(Error::Conflict(format!(
                        "client with NIP {} already exists",
                        client.nip
                    )))
                }
                other => other?,
            };
            Ok(Client { id, ..client.clone() })
        })?;

        info!(id = client.id, "client created");
        Ok(client)
    }

    pub fn get(&self, id: i64) -> Result<Client, Error> {
        self.db
            .with_conn(|conn| db::clients::get(conn, id))?
            .ok_or(Error::NotFound {
                entity: "client",
                id,
            })
    }

    /// Merge non-null fields into the stored row.
    pub fn update(&self, id: i64, patch: ClientPatch) -> Result<Client, Error> {
        let now = Utc::now();

        let name = patch
            .name
            .as_deref()
            .map(|v| required_text("name", v, MAX_NAME_LEN))
            .transpose()?;
        let nip = patch
            .nip
            .as_deref()
            .map(|v| normalize_nip("nip", v))
            .transpose()?;
        let address = patch
            .address
            .as_deref()
            .map(|v| optional_text("address", Some(v), MAX_NAME_LEN))
            .transpose()?;
        let city = patch
            .city
            .as_deref()
            .map(|v| optional_text("city", Some(v), MAX_NAME_LEN))
            .transpose()?;
        let postal_code = patch
            .postal_code
            .as_deref()
            .map(|v| optional_text("postal_code", Some(v), 16))
            .transpose()?;
        let email = patch
            .email
            .as_deref()
            .map(|v| validate_email("email", v))
            .transpose()?;
        let phone = patch
            .phone
            .as_deref()
            .map(|v| optional_text("phone", Some(v), 32))
            .transpose()?;

        self.db.with_tx(|tx| {
            let mut client = db::clients::get(tx, id)?.ok_or(Error::NotFound {
                entity: "client",
                id,
            })?;

            if let Some(name) = name {
                client.name = name;
            }
            if let Some(nip) = nip {
                client.nip = nip;
            }
            if let Some(address) = address {
                client.address = address;
            }
            if let Some(city) = city {
                client.city = city;
            }
            if let Some(postal_code) = postal_code {
                client.postal_code = postal_code;
            }
            if let Some(email) = email {
                client.email = Some(email);
            }
            if let Some(phone) = phone {
                client.phone = phone;
            }
            client.updated_at = now;

            match db::clients::update(tx, &client) {
                Err(Error::Conflict(_)) => Err(Error::Conflict(format!(
                    "client with NIP {} already exists",
                    client.nip
                ))),
                other => {
                    other?;
                    Ok(client)
                }
            }
        })
    }

    /// Delete a client. Rejected while any invoice references it.
    pub fn delete(&self, id: i64) -> Result<(), Error> {
        let deleted = self.db.with_tx(|tx| match db::clients::delete(tx, id) {
            Err(Error::ReferenceInUse(_)) => Err(Error::ReferenceInUse(format!(
                "client {id} has invoices and cannot be deleted"
            ))),
            other => other,
        })?;
        if !deleted {
            return Err(Error::NotFound {
                entity: "client",
                id,
            });
        }
        info!(id, "client deleted");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Client>, Error> {
        self.db.with_conn(db::clients::list)
    }
}
