//! Global constants for the labelmaker application

/// Label names a new manual session starts with
pub const DEFAULT_LABELS: &[&str] = &["Arc", "Peaks", "Rings", "Rods"];

/// Image extensions imported when the import format is `*`
pub const DEFAULT_IMAGE_FORMATS: &[&str] = &["tiff", "tif", "jpg", "jpeg", "png"];

/// File names that are never listed or imported
pub const HIDDEN_FORMATS: &[&str] = &["DS_Store"];

/// Number of thumbnail rows on one page
pub const DEFAULT_ROWS_PER_PAGE: usize = 4;

/// Default number of thumbnail columns
pub const DEFAULT_THUMBNAIL_COLUMNS: usize = 4;

/// Allowed thumbnail column range
pub const MAX_THUMBNAIL_COLUMNS: usize = 5;

/// Default classifier threshold, in percent
pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 51.0;

/// Directory (under the container root) that exports land in by default
pub const OUTPUT_DIR_NAME: &str = "labelmaker_outputs";

/// Container-side data root used when no configuration overrides it
pub const DEFAULT_CONTAINER_ROOT: &str = "/app/data";

/// Environment variable naming the host-side mount of the data root
pub const HOST_ROOT_ENV: &str = "DATA_DIR";

/// Colour cycle for label buttons and thumbnail borders (24 entries).
pub const LABEL_COLORS: [&str; 24] = [
    "#FD3216", "#00FE35", "#6A76FC", "#FED4C4", "#FE00CE", "#0DF9FF", "#F6F926", "#FF9616",
    "#479B55", "#EEA6FB", "#DC587D", "#D626FF", "#6E899C", "#00B5F7", "#B68E00", "#C9FBE5",
    "#FF0092", "#22FFA7", "#E3EE9E", "#86CE00", "#BC7196", "#7E7DCD", "#FC6955", "#E48F72",
];

/// Colour for a label position, wrapping around the cycle.
pub fn label_color(label: usize) -> &'static str {
    LABEL_COLORS[label % LABEL_COLORS.len()]
}
