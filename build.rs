fn main() {
    println!("cargo:rerun-if-env-changed=ESPFAN_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=ESPFAN_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=ESPFAN_CONFIG");

    // ESP-IDF link arguments are only needed when cross-compiling for the
    // device; host builds run the simulation adapters.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
