mod catalog;
mod notification;
mod payment;
mod users;

pub use catalog::*;
pub use notification::*;
pub use payment::*;
pub use users::*;

use crate::settings::ServiceSettings;

/// Clients for every outside service the app talks to
#[derive(Debug)]
pub struct Collaborators {
    pub catalog: CatalogClient,
    pub payments: PaymentClient,
    pub notifications: NotificationClient,
    pub users: UserDirectoryClient,
}

impl Collaborators {
    pub fn from_settings(settings: &ServiceSettings) -> anyhow::Result<Self> {
        let timeout = settings.timeout();

        Ok(Self {
            catalog: CatalogClient::new(settings.courses_base_url()?, timeout)?,
            payments: PaymentClient::new(settings.payments_base_url()?, timeout)?,
            notifications: NotificationClient::new(settings.notifications_base_url()?, timeout)?,
            users: UserDirectoryClient::new(settings.users_base_url()?, timeout)?,
        })
    }
}
