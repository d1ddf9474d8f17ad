fn main() {
    // Only the ESP-IDF build publishes the sysenv; host builds (tests) skip it.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
