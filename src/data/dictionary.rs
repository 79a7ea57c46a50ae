//! Closed-set code tables for well-known tag keys and values.
//!
//! Keys always encode as a [`FeatureType`] code, so an unlisted key is written as
//! [`FeatureType::Unknown`]. Values encode as a [`FeatureSubType`] code when listed and as
//! literal text otherwise.

/// UTF-16 unit of [`FeatureSubType::Unknown`]; listed values follow it. The block lies in the
/// low-surrogate range, which no one-unit literal can occupy, so a value slot of one unit is
/// always unambiguous.
pub const SUBTYPE_CODE_BASE: u16 = 0xDC00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FeatureType {
    Unknown = 0,
    Natural = 1,
    Place = 2,
    Water = 3,
    Railway = 4,
    Highway = 5,
    Landuse = 6,
    Building = 7,
    Leisure = 8,
    Amenity = 9,
    Boundary = 10,
    AdminLevel = 11,
}

impl FeatureType {
    pub fn from_key(key: &str) -> Self {
        match key {
            "natural" => FeatureType::Natural,
            "place" => FeatureType::Place,
            "water" => FeatureType::Water,
            "railway" => FeatureType::Railway,
            "highway" => FeatureType::Highway,
            "landuse" => FeatureType::Landuse,
            "building" => FeatureType::Building,
            "leisure" => FeatureType::Leisure,
            "amenity" => FeatureType::Amenity,
            "boundary" => FeatureType::Boundary,
            "admin_level" => FeatureType::AdminLevel,
            _ => FeatureType::Unknown,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(FeatureType::Unknown),
            1 => Some(FeatureType::Natural),
            2 => Some(FeatureType::Place),
            3 => Some(FeatureType::Water),
            4 => Some(FeatureType::Railway),
            5 => Some(FeatureType::Highway),
            6 => Some(FeatureType::Landuse),
            7 => Some(FeatureType::Building),
            8 => Some(FeatureType::Leisure),
            9 => Some(FeatureType::Amenity),
            10 => Some(FeatureType::Boundary),
            11 => Some(FeatureType::AdminLevel),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FeatureSubType {
    Unknown = 0,
    Square,
    Residential,
    Forest,
    Primary,
    Motorway,
    Beach,
    Secondary,
    Tertiary,
    Trunk,
    Unclassified,
    Service,
    Track,
    Footway,
    Cycleway,
    Path,
    Rail,
    Subway,
    Tram,
    River,
    Stream,
    Canal,
    Lake,
    Pond,
    Reservoir,
    Wood,
    Grassland,
    Heath,
    Scrub,
    Wetland,
    Sand,
    Farmland,
    Meadow,
    Industrial,
    Commercial,
    Retail,
    Cemetery,
    Park,
    Garden,
    Playground,
    Administrative,
    City,
    Town,
    Village,
    Hamlet,
    Suburb,
}

impl FeatureSubType {
    /// Every listed value, indexed by `ordinal - 1`.
    pub const KNOWN: [FeatureSubType; 45] = [
        FeatureSubType::Square,
        FeatureSubType::Residential,
        FeatureSubType::Forest,
        FeatureSubType::Primary,
        FeatureSubType::Motorway,
        FeatureSubType::Beach,
        FeatureSubType::Secondary,
        FeatureSubType::Tertiary,
        FeatureSubType::Trunk,
        FeatureSubType::Unclassified,
        FeatureSubType::Service,
        FeatureSubType::Track,
        FeatureSubType::Footway,
        FeatureSubType::Cycleway,
        FeatureSubType::Path,
        FeatureSubType::Rail,
        FeatureSubType::Subway,
        FeatureSubType::Tram,
        FeatureSubType::River,
        FeatureSubType::Stream,
        FeatureSubType::Canal,
        FeatureSubType::Lake,
        FeatureSubType::Pond,
        FeatureSubType::Reservoir,
        FeatureSubType::Wood,
        FeatureSubType::Grassland,
        FeatureSubType::Heath,
        FeatureSubType::Scrub,
        FeatureSubType::Wetland,
        FeatureSubType::Sand,
        FeatureSubType::Farmland,
        FeatureSubType::Meadow,
        FeatureSubType::Industrial,
        FeatureSubType::Commercial,
        FeatureSubType::Retail,
        FeatureSubType::Cemetery,
        FeatureSubType::Park,
        FeatureSubType::Garden,
        FeatureSubType::Playground,
        FeatureSubType::Administrative,
        FeatureSubType::City,
        FeatureSubType::Town,
        FeatureSubType::Village,
        FeatureSubType::Hamlet,
        FeatureSubType::Suburb,
    ];

    pub fn from_value(value: &str) -> Self {
        match value {
            "square" => FeatureSubType::Square,
            "residential" => FeatureSubType::Residential,
            "forest" => FeatureSubType::Forest,
            "primary" => FeatureSubType::Primary,
            "motorway" => FeatureSubType::Motorway,
            "beach" => FeatureSubType::Beach,
            "secondary" => FeatureSubType::Secondary,
            "tertiary" => FeatureSubType::Tertiary,
            "trunk" => FeatureSubType::Trunk,
            "unclassified" => FeatureSubType::Unclassified,
            "service" => FeatureSubType::Service,
            "track" => FeatureSubType::Track,
            "footway" => FeatureSubType::Footway,
            "cycleway" => FeatureSubType::Cycleway,
            "path" => FeatureSubType::Path,
            "rail" => FeatureSubType::Rail,
            "subway" => FeatureSubType::Subway,
            "tram" => FeatureSubType::Tram,
            "river" => FeatureSubType::River,
            "stream" => FeatureSubType::Stream,
            "canal" => FeatureSubType::Canal,
            "lake" => FeatureSubType::Lake,
            "pond" => FeatureSubType::Pond,
            "reservoir" => FeatureSubType::Reservoir,
            "wood" => FeatureSubType::Wood,
            "grassland" => FeatureSubType::Grassland,
            "heath" => FeatureSubType::Heath,
            "scrub" => FeatureSubType::Scrub,
            "wetland" => FeatureSubType::Wetland,
            "sand" => FeatureSubType::Sand,
            "farmland" => FeatureSubType::Farmland,
            "meadow" => FeatureSubType::Meadow,
            "industrial" => FeatureSubType::Industrial,
            "commercial" => FeatureSubType::Commercial,
            "retail" => FeatureSubType::Retail,
            "cemetery" => FeatureSubType::Cemetery,
            "park" => FeatureSubType::Park,
            "garden" => FeatureSubType::Garden,
            "playground" => FeatureSubType::Playground,
            "administrative" => FeatureSubType::Administrative,
            "city" => FeatureSubType::City,
            "town" => FeatureSubType::Town,
            "village" => FeatureSubType::Village,
            "hamlet" => FeatureSubType::Hamlet,
            "suburb" => FeatureSubType::Suburb,
            _ => FeatureSubType::Unknown,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code.checked_sub(SUBTYPE_CODE_BASE)? {
            0 => Some(FeatureSubType::Unknown),
            ordinal => Self::KNOWN.get(usize::from(ordinal) - 1).copied(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureSubType::Unknown => "unknown",
            FeatureSubType::Square => "square",
            FeatureSubType::Residential => "residential",
            FeatureSubType::Forest => "forest",
            FeatureSubType::Primary => "primary",
            FeatureSubType::Motorway => "motorway",
            FeatureSubType::Beach => "beach",
            FeatureSubType::Secondary => "secondary",
            FeatureSubType::Tertiary => "tertiary",
            FeatureSubType::Trunk => "trunk",
            FeatureSubType::Unclassified => "unclassified",
            FeatureSubType::Service => "service",
            FeatureSubType::Track => "track",
            FeatureSubType::Footway => "footway",
            FeatureSubType::Cycleway => "cycleway",
            FeatureSubType::Path => "path",
            FeatureSubType::Rail => "rail",
            FeatureSubType::Subway => "subway",
            FeatureSubType::Tram => "tram",
            FeatureSubType::River => "river",
            FeatureSubType::Stream => "stream",
            FeatureSubType::Canal => "canal",
            FeatureSubType::Lake => "lake",
            FeatureSubType::Pond => "pond",
            FeatureSubType::Reservoir => "reservoir",
            FeatureSubType::Wood => "wood",
            FeatureSubType::Grassland => "grassland",
            FeatureSubType::Heath => "heath",
            FeatureSubType::Scrub => "scrub",
            FeatureSubType::Wetland => "wetland",
            FeatureSubType::Sand => "sand",
            FeatureSubType::Farmland => "farmland",
            FeatureSubType::Meadow => "meadow",
            FeatureSubType::Industrial => "industrial",
            FeatureSubType::Commercial => "commercial",
            FeatureSubType::Retail => "retail",
            FeatureSubType::Cemetery => "cemetery",
            FeatureSubType::Park => "park",
            FeatureSubType::Garden => "garden",
            FeatureSubType::Playground => "playground",
            FeatureSubType::Administrative => "administrative",
            FeatureSubType::City => "city",
            FeatureSubType::Town => "town",
            FeatureSubType::Village => "village",
            FeatureSubType::Hamlet => "hamlet",
            FeatureSubType::Suburb => "suburb",
        }
    }

    pub fn is_known(self) -> bool {
        self != FeatureSubType::Unknown
    }

    /// Position in the closed list, 1-based; 0 for [`FeatureSubType::Unknown`].
    pub fn ordinal(self) -> u16 {
        self as u16
    }

    pub fn code(self) -> u16 {
        SUBTYPE_CODE_BASE + self.ordinal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_key_is_unknown() {
        assert_eq!(FeatureType::from_key("highway"), FeatureType::Highway);
        assert_eq!(FeatureType::from_key("admin_level").code(), 11);
        assert_eq!(FeatureType::from_key("name"), FeatureType::Unknown);
        assert_eq!(FeatureType::from_key("Highway"), FeatureType::Unknown);
        assert_eq!(FeatureType::Unknown.code(), 0);
    }

    #[test]
    fn test_key_codes_round_trip() {
        for code in 0..=11 {
            let feature_type = FeatureType::from_code(code).unwrap();
            assert_eq!(feature_type.code(), code);
        }
        assert_eq!(FeatureType::from_code(12), None);
    }

    #[test]
    fn test_known_values_are_numbered_in_order() {
        for (index, subtype) in FeatureSubType::KNOWN.iter().enumerate() {
            assert_eq!(usize::from(subtype.ordinal()), index + 1);
            assert_eq!(subtype.code(), SUBTYPE_CODE_BASE + subtype.ordinal());
            assert_eq!(FeatureSubType::from_value(subtype.as_str()), *subtype);
            assert_eq!(FeatureSubType::from_code(subtype.code()), Some(*subtype));
        }
        assert_eq!(FeatureSubType::from_code(SUBTYPE_CODE_BASE + 46), None);
        assert_eq!(FeatureSubType::from_code(7), None);
    }

    #[test]
    fn test_no_single_character_is_a_value_code() {
        let mut units = [0u16; 2];
        for ch in (0..=0xFFFF).filter_map(char::from_u32) {
            let encoded = ch.encode_utf16(&mut units);
            assert_eq!(FeatureSubType::from_code(encoded[0]), None, "{:?}", ch);
        }
    }

    #[test]
    fn test_unlisted_values() {
        assert_eq!(FeatureSubType::from_value("secondary"), FeatureSubType::Secondary);
        assert!(!FeatureSubType::from_value("cafe").is_known());
        assert!(!FeatureSubType::from_value("yes").is_known());
        assert!(!FeatureSubType::from_value("unknown").is_known());
        assert!(!FeatureSubType::from_value("").is_known());
    }
}
