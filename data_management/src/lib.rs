pub mod gpx_util;
pub mod replay;
