fn main() {
    // ESP-IDF のビルド設定 (リンカ引数や MCU の cfg) は実機ターゲットのときだけ中継する
    let target_arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if target_arch == "xtensa" || target_arch == "riscv32" {
        embuild::espidf::sysenv::output();
    }
}
