#![no_main]

use libfuzzer_sys::fuzz_target;
use tether_markup::{BindingExpression, parse};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(expr) = parse(input) else {
        return;
    };
    // Anything accepted must survive a trip through its canonical form.
    let reparsed: BindingExpression = expr
        .to_string()
        .parse()
        .expect("canonical form parses");
    assert_eq!(reparsed, expr);
});
