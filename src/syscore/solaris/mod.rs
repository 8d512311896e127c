mod port;

pub(crate) use port::*;
