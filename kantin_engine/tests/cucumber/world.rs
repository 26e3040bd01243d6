use cucumber::World;
use kantin_engine::{
    db_types::{MenuItem, Order, Vendor},
    payment_objects::{CheckoutReceipt, PaymentConfig},
    test_utils::{
        prepare_env::fresh_database,
        scripted_provider::ScriptedProvider,
        seed::{seed_catalog, Catalog},
    },
    OrderFlowError,
    PaymentApi,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct KantinWorld {
    pub system: Option<FoodCourt>,
}

#[derive(Debug)]
pub struct FoodCourt {
    pub db: SqliteDatabase,
    pub provider: ScriptedProvider,
    pub catalog: Catalog,
    pub last_receipt: Option<CheckoutReceipt>,
    pub last_error: Option<OrderFlowError>,
}

impl KantinWorld {
    pub fn court(&self) -> &FoodCourt {
        self.system.as_ref().expect("Food court not initialised")
    }

    pub fn court_mut(&mut self) -> &mut FoodCourt {
        self.system.as_mut().expect("Food court not initialised")
    }
}

impl FoodCourt {
    pub async fn new() -> Self {
        let db = fresh_database().await;
        debug!("Created database: {}", db.url());
        let catalog = seed_catalog(&db).await;
        Self { db, provider: ScriptedProvider::new(), catalog, last_receipt: None, last_error: None }
    }

    pub fn payments(&self) -> PaymentApi<SqliteDatabase, ScriptedProvider> {
        PaymentApi::new(self.db.clone(), self.provider.clone(), PaymentConfig::default())
    }

    pub fn vendor(&self, name: &str) -> &Vendor {
        let c = &self.catalog;
        [&c.warung, &c.bakso].into_iter().find(|v| v.name == name).unwrap_or_else(|| panic!("No vendor {name}"))
    }

    pub fn menu_item(&self, name: &str) -> &MenuItem {
        let c = &self.catalog;
        [&c.nasi_goreng, &c.es_teh, &c.bakso_urat]
            .into_iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("No menu item {name}"))
    }

    pub fn last_order(&self) -> &Order {
        &self.last_receipt.as_ref().expect("No order has been placed").order
    }
}
