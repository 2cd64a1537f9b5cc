mod common;
mod decoding;
mod form;
