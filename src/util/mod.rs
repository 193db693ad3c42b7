pub mod base64helper;
