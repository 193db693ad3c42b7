/// Generates a getter for a string valued header member.
///
/// Returns `None` if the member is not set or is not a JSON string.
///
/// # Arguments
///
/// * `field_name` - name of the header member, also used for the getter name
macro_rules! create_header_getter {
    ($field_name:ident) => {
        paste::item! {
            #[doc = concat!(
                "Gets `",
                stringify!($field_name),
                "` header value.\n\n",
                "Will default to `None` if not set."
            )]
            pub fn [< get_ $field_name >](&self) -> Option<&str> {
                self.0.get(stringify!($field_name)).and_then(|v| v.as_str())
            }
        }
    };
}
pub(crate) use create_header_getter;
