//! The intrinsic name table, injected at scope depth −1.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Names of the builtins visible in every scope.
pub const INTRINSIC: &[&str] = &[
    // ===== type atoms =====
    "typ",
    "symbol",
    "ptr",
    "i8",
    "u8",
    "i16",
    "u16",
    "i32",
    "u32",
    "i64",
    "u64",
    "i128",
    "u128",
    "f32",
    "f64",
    "bool",
    "uint",
    "null_t",
    // ===== type constructors =====
    "join!",
    "arr!",
    "union!",
    "fn!",
    "opaque!",
    // ===== type destruct / reflection =====
    "split!",
    "~arr!",
    "~union!",
    "~fn!",
    "~opaque!",
    // ===== type relation / predicate =====
    "eq!",
    "has!",
    "fn?",
    "opaque?",
    // ===== type structural edit =====
    "add!",
    "rm!",
    // ===== parameter / default behavior =====
    "default!",
    "strip!",
    // ===== compile-time query / control =====
    "if!",
    "loop!",
    "typeof!",
    "sizeof!",
    "offsetof!",
    "get!",
    "as!",
    // ===== effect builtins =====
    "print!",
    "readi32!",
    "readchr!",
    // ===== operators (ctfe + runtime) =====
    "+",
    "-",
    "*",
    "/",
    "%",
    "&",
    "|",
    "^",
    "<<",
    ">>",
    "==",
    "!=",
    "<",
    "<=",
    ">",
    ">=",
    "!",
    "&&",
    "||",
    // ===== special type parameter =====
    "...",
];

static INTRINSIC_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| INTRINSIC.iter().copied().collect());

/// The intrinsic names denoting side effects.
static EFFECT_BUILTINS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["print!", "readi32!", "readchr!"].into_iter().collect());

pub fn is_intrinsic(name: &str) -> bool {
    INTRINSIC_SET.contains(name)
}

pub fn is_effect_builtin(name: &str) -> bool {
    EFFECT_BUILTINS.contains(name)
}
