fn main() {
    // ESP-IDF environment is only needed for the device image; host test
    // builds skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
