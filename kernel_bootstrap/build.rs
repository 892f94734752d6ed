fn main() {
    // Linker configuration for the firmware image. Host builds (the library
    // and its tests) need none.
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.starts_with("avr") {
        println!("cargo:rustc-link-arg-bins=-mmcu=atmega328p");
        println!("cargo:rustc-link-arg-bins=-Wl,--gc-sections");
    }
}
