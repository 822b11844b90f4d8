/// Marker for "not specified" numeric request parameters.
pub const UNSPECIFIED: u32 = 0;

pub const MIN_WINDOW_SIZE: u32 = 3;
pub const MAX_WINDOW_SIZE: u32 = 20;
pub const DEFAULT_WINDOW_SIZE: u32 = 10;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_SET_SIZE: usize = 20;

pub const QUERY_FILL_COLOR: &str = "red";
pub const DEFAULT_FAMILY_COLOR: &str = "gray";

pub const UNIPROT_TITLE: &str = "UniProt";

/// Colors handed out round-robin to families the backend did not color.
pub const FAMILY_PALETTE: &[&str] = &[
    "Pink",
    "HotPink",
    "DeepPink",
    "Salmon",
    "DarkSalmon",
    "LightCoral",
    "Coral",
    "DarkOrange",
    "Orange",
    "DarkKhaki",
    "Gold",
    "BurlyWood",
    "Tan",
    "RosyBrown",
    "SandyBrown",
    "Goldenrod",
    "DarkGoldenrod",
    "Peru",
    "Chocolate",
    "SaddleBrown",
    "Sienna",
    "Brown",
    "DarkOliveGreen",
    "Olive",
    "OliveDrab",
    "YellowGreen",
    "LimeGreen",
    "Lime",
    "LightGreen",
    "DarkSeaGreen",
    "MediumAquamarine",
    "MediumSeaGreen",
    "SeaGreen",
    "Green",
    "DarkGreen",
    "Cyan",
    "Turquoise",
    "LightSeaGreen",
    "CadetBlue",
    "Teal",
    "LightSteelBlue",
    "SkyBlue",
    "DeepSkyBlue",
    "DodgerBlue",
    "CornflowerBlue",
    "SteelBlue",
    "RoyalBlue",
    "Blue",
    "MediumBlue",
    "DarkBlue",
    "Navy",
    "MidnightBlue",
    "Thistle",
    "Plum",
    "Violet",
    "Orchid",
    "Fuchsia",
    "MediumOrchid",
    "MediumPurple",
    "BlueViolet",
    "DarkViolet",
    "DarkOrchid",
    "Purple",
    "Indigo",
    "DarkSlateBlue",
    "SlateBlue",
    "LightSlateGray",
    "DarkSlateGray",
];

pub fn clamp_window_size(window: u32) -> u32 {
    window.clamp(MIN_WINDOW_SIZE, MAX_WINDOW_SIZE)
}
