use std::env;

fn main() {
    // 告诉 cargo 在 build.rs 变化时重新运行
    println!("cargo:rerun-if-changed=build.rs");

    // 主机测试不需要任何链接配置
    let target = env::var("TARGET").unwrap_or_default();
    if !target.starts_with("xtensa-esp32s3") {
        return;
    }

    // esp-hal 1.0 提供 linkall.x，固件二进制需要显式链接
    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    }
}
