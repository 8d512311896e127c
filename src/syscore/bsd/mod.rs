mod kqueue;

pub(crate) use kqueue::*;
