//! Taxonomía fija de categorías y niveles de visibilidad para la metadata.
//!
//! Cada analizador declara una tabla estática `clave → (categorías, visibilidad)`
//! construida con [`TagRule`]; las claves ausentes caen en [`TagClass::UNMAPPED`].

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Time,
    CreationTime,
    ModifyTime,
    Author,
    AuthorName,
    Comment,
    Tool,
    Hardware,
    Software,
    Location,
    PositionLatitude,
    PositionLongitude,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Time,
        Category::CreationTime,
        Category::ModifyTime,
        Category::Author,
        Category::AuthorName,
        Category::Comment,
        Category::Tool,
        Category::Hardware,
        Category::Software,
        Category::Location,
        Category::PositionLatitude,
        Category::PositionLongitude,
    ];

    /// Categorías principales, en el orden en que se agrupa la salida.
    pub const MAIN: [Category; 4] = [
        Category::Time,
        Category::Author,
        Category::Tool,
        Category::Location,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Time => "time",
            Category::CreationTime => "creation_time",
            Category::ModifyTime => "modify_time",
            Category::Author => "author",
            Category::AuthorName => "author_name",
            Category::Comment => "comment",
            Category::Tool => "tool",
            Category::Hardware => "hardware",
            Category::Software => "software",
            Category::Location => "location",
            Category::PositionLatitude => "position_latitude",
            Category::PositionLongitude => "position_longitude",
        }
    }

    /// Categoría principal de la que cuelga esta subcategoría.
    pub fn parent(self) -> Category {
        match self {
            Category::Time | Category::CreationTime | Category::ModifyTime => Category::Time,
            Category::Author | Category::AuthorName | Category::Comment => Category::Author,
            Category::Tool | Category::Hardware | Category::Software => Category::Tool,
            Category::Location | Category::PositionLatitude | Category::PositionLongitude => {
                Category::Location
            }
        }
    }

    pub fn is_main(self) -> bool {
        self.parent() == self
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("categoría desconocida `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

/// Conjunto de categorías con semántica de conjunto (sin orden ni duplicados).
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct CategorySet(u16);

impl CategorySet {
    pub const EMPTY: CategorySet = CategorySet(0);

    pub const fn from_slice(categories: &[Category]) -> Self {
        let mut bits = 0u16;
        let mut index = 0;
        while index < categories.len() {
            bits |= 1 << (categories[index] as u16);
            index += 1;
        }
        CategorySet(bits)
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn intersects(&self, other: &CategorySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }

    /// Nombres separados por coma, como se muestran en la columna de categorías.
    pub fn joined(&self) -> String {
        self.iter()
            .map(Category::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::EMPTY;
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for CategorySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for category in self.iter() {
            seq.serialize_element(&category)?;
        }
        seq.end()
    }
}

/// Nivel mínimo de verbosidad necesario para mostrar un registro.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Visibility {
    Always = 1,
    Detailed = 2,
    Full = 3,
}

impl Visibility {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

/// Clasificación asignada a una clave al crear el registro.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TagClass {
    pub categories: CategorySet,
    pub visibility: Visibility,
}

impl TagClass {
    pub const UNMAPPED: TagClass = TagClass {
        categories: CategorySet::EMPTY,
        visibility: Visibility::Full,
    };
}

/// Entrada de una tabla de taxonomía de un analizador.
pub struct TagRule {
    pub key: &'static str,
    pub class: TagClass,
}

impl TagRule {
    pub const fn new(
        key: &'static str,
        categories: &[Category],
        visibility: Visibility,
    ) -> Self {
        Self {
            key,
            class: TagClass {
                categories: CategorySet::from_slice(categories),
                visibility,
            },
        }
    }
}

/// Busca `key` en la tabla; las claves sin regla quedan sin categorías y con visibilidad 3.
pub fn classify(table: &[TagRule], key: &str) -> TagClass {
    table
        .iter()
        .find(|rule| rule.key == key)
        .map(|rule| rule.class)
        .unwrap_or(TagClass::UNMAPPED)
}

/// Árbol de categorías que se imprime con `--filteroptions`.
pub fn category_tree() -> String {
    let mut output = String::new();
    for (index, main) in Category::MAIN.iter().enumerate() {
        let last_main = index + 1 == Category::MAIN.len();
        output.push_str(&format!("|-- {main}\n"));
        for sub in Category::ALL
            .iter()
            .filter(|category| !category.is_main() && category.parent() == *main)
        {
            let branch = if last_main { "    " } else { "|   " };
            output.push_str(&format!("{branch}|-- {sub}\n"));
        }
        if !last_main {
            output.push_str("|\n");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[TagRule] = &[
        TagRule::new(
            "creator",
            &[Category::Author, Category::AuthorName],
            Visibility::Always,
        ),
        TagRule::new("GPSInfo", &[Category::Location], Visibility::Detailed),
    ];

    #[test]
    fn unmapped_keys_get_no_categories_and_full_visibility() {
        let class = classify(TABLE, "revision");
        assert!(class.categories.is_empty());
        assert_eq!(class.visibility, Visibility::Full);
        assert_eq!(class.visibility.level(), 3);
    }

    #[test]
    fn mapped_keys_keep_every_category() {
        let class = classify(TABLE, "creator");
        assert!(class.categories.contains(Category::Author));
        assert!(class.categories.contains(Category::AuthorName));
        assert!(!class.categories.contains(Category::Location));
        assert_eq!(class.visibility, Visibility::Always);
    }

    #[test]
    fn category_set_intersection() {
        let record = CategorySet::from_slice(&[Category::Author, Category::AuthorName]);
        let only_name = CategorySet::from_slice(&[Category::AuthorName]);
        let only_author = CategorySet::from_slice(&[Category::Author]);
        let location = CategorySet::from_slice(&[Category::Location]);

        assert!(record.intersects(&only_name));
        assert!(record.intersects(&only_author));
        assert!(!record.intersects(&location));
        assert!(!CategorySet::EMPTY.intersects(&record));
    }

    #[test]
    fn category_names_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>(), Ok(category));
        }
        assert!("places".parse::<Category>().is_err());
    }

    #[test]
    fn unknown_category_reports_the_name() {
        let error = " places ".parse::<Category>().unwrap_err();
        assert_eq!(error, UnknownCategory("places".to_string()));
        assert_eq!(error.to_string(), "categoría desconocida `places`");
    }

    #[test]
    fn every_subcategory_has_a_main_parent() {
        for category in Category::ALL {
            assert!(Category::MAIN.contains(&category.parent()));
        }
    }

    #[test]
    fn category_tree_lists_all_names() {
        let tree = category_tree();
        for category in Category::ALL {
            assert!(tree.contains(category.name()));
        }
    }
}
