//! Fixed option lists offered by the stage forms.
//!
//! Membership is advisory only: values outside these lists are still
//! forwarded to the prediction services.

pub const SOIL_COLORS: [&str; 6] = [
    "Black",
    "Red",
    "Dark Brown",
    "Reddish Brown",
    "Light Brown",
    "Medium Brown",
];

pub const REGIONS: [&str; 36] = [
    "ANDAMAN And NICOBAR",
    "ANDHRA PRADESH",
    "ARUNACHAL PRADESH",
    "ASSAM",
    "BIHAR",
    "CHANDIGARH",
    "CHHATTISGARH",
    "DADRA And NAGAR HAVELI",
    "DAMAN And DIU",
    "DELHI",
    "GOA",
    "GUJARAT",
    "HARYANA",
    "HIMACHAL PRADESH",
    "JAMMU And KASHMIR",
    "JHARKHAND",
    "KARNATAKA",
    "KERALA",
    "LAKSHADWEEP",
    "MADHYA PRADESH",
    "MAHARASHTRA",
    "MANIPUR",
    "MEGHALAYA",
    "MIZORAM",
    "NAGALAND",
    "ODISHA",
    "PUDUCHERRY",
    "PUNJAB",
    "RAJASTHAN",
    "SIKKIM",
    "TAMIL NADU",
    "TELANGANA",
    "TRIPURA",
    "UTTAR PRADESH",
    "UTTARAKHAND",
    "WEST BENGAL",
];

pub fn is_known_soil_color(value: &str) -> bool {
    SOIL_COLORS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(value.trim()))
}

pub fn is_known_region(value: &str) -> bool {
    REGIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(value.trim()))
}
