use crate::{
    db_types::{MenuItem, Rupiah, Vendor},
    SqliteDatabase,
};

/// Two vendors and three menu items.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub warung: Vendor,
    pub bakso: Vendor,
    /// Rp10.000 at the warung
    pub nasi_goreng: MenuItem,
    /// Rp5.000 at the warung
    pub es_teh: MenuItem,
    /// Rp15.000 at the bakso stall
    pub bakso_urat: MenuItem,
}

pub async fn seed_catalog(db: &SqliteDatabase) -> Catalog {
    let warung = db.insert_vendor("Warung Bu Sri").await.expect("Error creating vendor");
    let bakso = db.insert_vendor("Bakso Pak Kumis").await.expect("Error creating vendor");
    let nasi_goreng =
        db.insert_menu_item(warung.id, "Nasi Goreng", Rupiah::from(10_000)).await.expect("Error creating menu item");
    let es_teh = db.insert_menu_item(warung.id, "Es Teh", Rupiah::from(5_000)).await.expect("Error creating menu item");
    let bakso_urat =
        db.insert_menu_item(bakso.id, "Bakso Urat", Rupiah::from(15_000)).await.expect("Error creating menu item");
    Catalog { warung, bakso, nasi_goreng, es_teh, bakso_urat }
}
