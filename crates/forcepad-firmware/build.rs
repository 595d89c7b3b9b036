use std::env;

fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    // Without it Bluetooth stays disabled and the main task stack is the IDF default.
    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        println!("cargo:warning=ESP_IDF_SDKCONFIG_DEFAULTS not set! Bluetooth may be disabled.");
        println!(
            "cargo:warning=Build from crates/forcepad-firmware so .cargo/config.toml applies."
        );
    }

    embuild::espidf::sysenv::output();
}
