mod bson;

pub(crate) use self::bson::{value_cmp, value_eq, value_key, values_at_path};
