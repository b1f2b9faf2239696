//! Display-name tables for raw dataset codes
//!
//! The dataset stores cities in lower case without accents, states as
//! two-letter codes, and categories/payment types as snake_case codes. These
//! tables turn them into readable labels for charts. Codes without an entry
//! are shown as-is.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static CITY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("sao paulo", "São Paulo"),
        ("rio de janeiro", "Rio de Janeiro"),
        ("belo horizonte", "Belo Horizonte"),
        ("brasilia", "Brasília"),
        ("curitiba", "Curitiba"),
    ])
});

static STATE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("AC", "Acre"),
        ("AL", "Alagoas"),
        ("AP", "Amapá"),
        ("AM", "Amazonas"),
        ("BA", "Bahia"),
        ("CE", "Ceará"),
        ("DF", "Distrito Federal"),
        ("ES", "Espírito Santo"),
        ("GO", "Goiás"),
        ("MA", "Maranhão"),
        ("MT", "Mato Grosso"),
        ("MS", "Mato Grosso do Sul"),
        ("MG", "Minas Gerais"),
        ("PA", "Pará"),
        ("PB", "Paraíba"),
        ("PR", "Paraná"),
        ("PE", "Pernambuco"),
        ("PI", "Piauí"),
        ("RJ", "Rio de Janeiro"),
        ("RN", "Rio Grande do Norte"),
        ("RS", "Rio Grande do Sul"),
        ("RO", "Rondônia"),
        ("RR", "Roraima"),
        ("SC", "Santa Catarina"),
        ("SP", "São Paulo"),
        ("SE", "Sergipe"),
        ("TO", "Tocantins"),
    ])
});

// Several codes in the dataset are misspelled or split duplicates of the same
// category; they map onto a single display name.
static CATEGORY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("office_furniture", "Office Furniture"),
        ("housewares", "Housewares"),
        ("home_confort", "Home Comfort"),
        ("home_comfort_2", "Home Comfort"),
        ("sports_leisure", "Sports & Leisure"),
        ("computers_accessories", "Computers & Accessories"),
        ("toys", "Toys"),
        ("furniture_decor", "Furniture & Decor"),
        ("auto", "Automotive"),
        ("air_conditioning", "Air Conditioning"),
        ("telephony", "Telephony"),
        ("health_beauty", "Health & Beauty"),
        ("garden_tools", "Garden Tools"),
        ("pet_shop", "Pet Shop"),
        ("bed_bath_table", "Bed, Bath & Table"),
        ("baby", "Baby Products"),
        ("watches_gifts", "Watches & Gifts"),
        (
            "kitchen_dining_laundry_garden_furniture",
            "Kitchen, Dining & Garden Furniture",
        ),
        ("perfumery", "Perfumery"),
        ("art", "Art"),
        ("stationery", "Stationery"),
        ("fashio_female_clothing", "Women's Clothing"),
        ("consoles_games", "Consoles & Games"),
        ("construction_tools_lights", "Construction Tools & Lights"),
        ("food_drink", "Food & Drink"),
        ("drinks", "Beverages"),
        ("cool_stuff", "Cool Stuff"),
        ("fashion_bags_accessories", "Bags & Accessories"),
        ("home_construction", "Home Construction"),
        ("luggage_accessories", "Luggage & Accessories"),
        ("electronics", "Electronics"),
        ("home_appliances", "Home Appliances"),
        ("home_appliances_2", "Home Appliances"),
        ("fashion_male_clothing", "Men's Clothing"),
        ("small_appliances", "Small Appliances"),
        (
            "small_appliances_home_oven_and_coffee",
            "Oven & Coffee Appliances",
        ),
        ("books_general_interest", "Books - General"),
        ("costruction_tools_tools", "Construction Tools"),
        ("signaling_and_security", "Signaling & Security"),
        ("musical_instruments", "Musical Instruments"),
        ("construction_tools_construction", "Construction Equipment"),
        ("music", "Music"),
        ("fashion_shoes", "Shoes"),
        ("industry_commerce_and_business", "Industry & Commerce"),
        ("fashion_underwear_beach", "Underwear & Beachwear"),
        ("dvds_blu_ray", "DVDs & Blu-ray"),
        ("construction_tools_safety", "Construction Safety"),
        ("food", "Food"),
        ("fixed_telephony", "Fixed Telephony"),
        ("furniture_living_room", "Living Room Furniture"),
        ("tablets_printing_image", "Tablets & Printing"),
        ("market_place", "Marketplace"),
        ("christmas_supplies", "Christmas Supplies"),
        ("agro_industry_and_commerce", "Agro Industry & Commerce"),
        ("costruction_tools_garden", "Garden Construction Tools"),
        ("computers", "Computers"),
        ("furniture_bedroom", "Bedroom Furniture"),
        ("audio", "Audio"),
        ("books_imported", "Imported Books"),
        ("books_technical", "Technical Books"),
        ("party_supplies", "Party Supplies"),
        ("furniture_mattress_and_upholstery", "Mattresses & Upholstery"),
        ("la_cuisine", "La Cuisine"),
        ("flowers", "Flowers"),
        ("diapers_and_hygiene", "Diapers & Hygiene"),
        ("cine_photo", "Cinema & Photography"),
        ("cds_dvds_musicals", "CDs, DVDs & Musicals"),
        ("fashion_sport", "Sportswear"),
        ("arts_and_craftmanship", "Arts & Craftsmanship"),
        ("fashion_childrens_clothes", "Children's Clothing"),
        ("security_and_services", "Security & Services"),
    ])
});

static PAYMENT_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("credit_card", "Credit Card"),
        ("boleto", "Boleto"),
        ("voucher", "Voucher"),
        ("debit_card", "Debit Card"),
        ("not_defined", "Not Defined"),
    ])
});

/// Which display-name table a ranking's keys are looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTable {
    City,
    State,
    Category,
    Payment,
}

impl LabelTable {
    /// Display name for a raw code, or the code itself when unmapped
    pub fn display_name(self, raw: &str) -> String {
        let found = match self {
            // City codes are matched case-insensitively
            LabelTable::City => CITY_NAMES.get(raw.to_lowercase().as_str()),
            LabelTable::State => STATE_NAMES.get(raw),
            LabelTable::Category => CATEGORY_NAMES.get(raw),
            LabelTable::Payment => PAYMENT_NAMES.get(raw),
        };
        found.map_or_else(|| raw.to_string(), |name| (*name).to_string())
    }
}

pub fn city_name(raw: &str) -> String {
    LabelTable::City.display_name(raw)
}

pub fn state_name(raw: &str) -> String {
    LabelTable::State.display_name(raw)
}

pub fn category_name(raw: &str) -> String {
    LabelTable::Category.display_name(raw)
}

pub fn payment_name(raw: &str) -> String {
    LabelTable::Payment.display_name(raw)
}
