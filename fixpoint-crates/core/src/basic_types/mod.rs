mod trail;

pub(crate) use trail::*;
