use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Key that disables category filtering.
pub const ALL_CATEGORIES_KEY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub emoji: String,
    pub keywords: Vec<String>,
}

impl Category {
    /// True when any keyword occurs in the lower-cased text of `fields`.
    #[must_use]
    pub fn matches(&self, fields: &[&str]) -> bool {
        let blob = fields
            .iter()
            .map(|f| f.to_lowercase())
            .collect::<Vec<_>>()
            .join(" • ");
        self.keywords
            .iter()
            .any(|k| blob.contains(k.to_lowercase().as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub categories: Vec<Category>,
}

impl CategoryTable {
    /// Look up a category by key (case-insensitive). `"all"` is never stored
    /// in the table and always returns `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Category> {
        let key = key.trim();
        self.categories
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(key))
    }

    /// The keyword table shipped with the app.
    #[must_use]
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .lines()
            .filter_map(|line| {
                let mut fields = line.splitn(4, '|');
                let key = fields.next()?;
                let label = fields.next()?;
                let emoji = fields.next()?;
                let keywords = fields.next()?;
                Some(Category {
                    key: key.to_string(),
                    label: label.to_string(),
                    emoji: emoji.to_string(),
                    keywords: keywords.split(',').map(str::to_string).collect(),
                })
            })
            .collect();
        Self { categories }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// One category per line: `key|label|emoji|keyword,keyword,...`.
const BUILTIN: &str = "\
wings|Wings|🍗|wing,wings,boneless,tenders,drum,flat
mexican|Mexican|🌮|mexican,taqueria,cantina,tex-mex,tortilla,taco,tacos,birria,quesabirria,\
    al pastor,pastor,barbacoa,carnitas,carne asada,burrito,quesadilla,nacho,enchilada,\
    fajita,tostada,tamale,elote,guac,salsa,chips,margarita,tequila
pizza|Pizza|🍕|pizza,slice,pie,pizzeria,stromboli,calzone
burgers|Burgers|🍔|burger,cheeseburger,patty,smashburger,fries
sushi|Sushi|🍣|sushi,maki,sashimi,roll,nigiri,poke,ramen,hibachi,teriyaki
bbq|BBQ|🍖|bbq,barbecue,brisket,ribs,smoke,smoked,pulled pork
seafood|Seafood|🦞|seafood,shrimp,oyster,lobster,clams,mussels,crab,fish,salmon,tuna
pasta|Pasta|🍝|pasta,spaghetti,penne,vodka,alfredo,parm,lasagna,gnocchi,ravioli,italian
med|Mediterranean|🥙|mediterranean,med,greek,gyro,shawarma,falafel,halal,kebab,kabob,pita,\
    tzatziki,hummus,platter,lamb,chicken over rice
sandwiches|Sandwiches|🥪|sandwich,sub,hero,hoagie,wrap,panini,deli,cheesesteak
breakfast|Breakfast|🍳|breakfast,brunch,pancake,waffle,eggs,omelet,bacon,bagel
beer|Beer|🍺|beer,draft,pint,ipa,lager,brew,bucket,pitcher
cocktails|Cocktails|🍸|drink,cocktail,martini,margarita,mojito,old fashioned,whiskey,vodka,\
    tequila,wine,sangria
coffee|Coffee|☕|coffee,espresso,latte,cappuccino,cafe,cold brew
dessert|Dessert|🍰|dessert,ice cream,gelato,cake,brownie,cookie,donut,cannoli
happyhour|Happy Hour|⏰|happy hour,hh,2-for-1,two for one,bogo,half off
latenight|Late Night|🌙|late night,after 9,after 10,after 11,midnight,kitchen open late
barfood|Bar Food|🍻|bar food,apps,appetizer,nachos,sliders,wings,fries,pub,tavern
";

/// Load and validate a category table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let table: CategoryTable =
        serde_yaml::from_str(&content).map_err(ConfigError::CategoriesFileParse)?;

    validate_categories(&table)?;

    Ok(table)
}

fn validate_categories(table: &CategoryTable) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for category in &table.categories {
        let key = category.key.trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::Validation(
                "category key must be non-empty".to_string(),
            ));
        }

        if key == ALL_CATEGORIES_KEY {
            return Err(ConfigError::Validation(format!(
                "'{ALL_CATEGORIES_KEY}' is reserved and cannot be redefined"
            )));
        }

        if category.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' has no keywords",
                category.key
            )));
        }

        if !seen_keys.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate category key: '{}'",
                category.key
            )));
        }
    }

    Ok(())
}
