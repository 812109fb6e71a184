pub mod evidence;
pub mod location;
