// Wardrobe - Desktop/Mobile Shell

// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    wardrobe_lib::run()
}
