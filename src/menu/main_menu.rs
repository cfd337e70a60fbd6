use crate::component::highlight_reel::{
    HighlightStyle, MAX_MANUAL_SCENES, MIN_MANUAL_SCENES, SceneCountMode, format_mmss,
    normalize_duration_input,
};
use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::run_highlight_reel;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use rust_i18n::t;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_highlight"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_highlight_reel(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(2) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = vec![
            t!("settings.opt_highlight"),
            t!("settings.opt_detector"),
            t!("settings.opt_directories"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_highlight_settings_menu(term, config)?,
            Some(1) => show_detector_settings_menu(term, config)?,
            Some(2) => show_directory_settings_menu(term, config)?,
            Some(3) => show_language_menu(term, config)?,
            Some(4) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn announce_saved(value: impl Display) {
    println!("\n{} {}", style(t!("settings.saved")).green(), value);
    std::thread::sleep(std::time::Duration::from_secs(1));
}

/// 精華剪輯預設值
fn show_highlight_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.highlight.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let highlight = &config.settings.highlight;
        let on_off = |flag: bool| {
            if flag {
                t!("common.on")
            } else {
                t!("common.off")
            }
        };
        let scene_count = match highlight.scene_count {
            SceneCountMode::Auto => t!("settings.highlight.scene_auto").to_string(),
            SceneCountMode::Manual(n) => n.to_string(),
        };

        let options = vec![
            format!(
                "{}: {}",
                t!("settings.highlight.opt_target"),
                format_mmss(highlight.target_duration_secs)
            ),
            format!("{}: {}", t!("settings.highlight.opt_scenes"), scene_count),
            format!(
                "{}: {}",
                t!("settings.highlight.opt_style"),
                highlight.style.label()
            ),
            format!(
                "{}: {}",
                t!("settings.highlight.opt_captions"),
                on_off(highlight.include_captions)
            ),
            format!(
                "{}: {}",
                t!("settings.highlight.opt_cost"),
                on_off(highlight.cost_optimize)
            ),
            t!("settings.back").to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => edit_target_duration(config)?,
            Some(1) => edit_scene_count(term, config)?,
            Some(2) => edit_style(term, config)?,
            Some(3) => {
                config.settings.highlight.include_captions =
                    !config.settings.highlight.include_captions;
                save_settings(&config.settings)?;
                announce_saved(on_off(config.settings.highlight.include_captions));
            }
            Some(4) => {
                config.settings.highlight.cost_optimize = !config.settings.highlight.cost_optimize;
                save_settings(&config.settings)?;
                announce_saved(on_off(config.settings.highlight.cost_optimize));
            }
            Some(5) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn edit_target_duration(config: &mut Config) -> Result<()> {
    let current = format_mmss(config.settings.highlight.target_duration_secs);
    let input: String = Input::new()
        .with_prompt(t!("settings.highlight.target_prompt"))
        .default(current)
        .interact_text()?;

    // 格式錯誤時維持原設定
    let Some(seconds) = normalize_duration_input(&input) else {
        println!("{}", style(t!("settings.highlight.invalid_duration")).yellow());
        std::thread::sleep(std::time::Duration::from_secs(1));
        return Ok(());
    };

    if (seconds - config.settings.highlight.target_duration_secs).abs() > f64::EPSILON {
        config.settings.highlight.target_duration_secs = seconds;
        save_settings(&config.settings)?;
        announce_saved(format_mmss(seconds));
    }

    Ok(())
}

fn edit_scene_count(term: &Term, config: &mut Config) -> Result<()> {
    let items = vec![
        t!("settings.highlight.scene_auto").to_string(),
        t!("settings.highlight.scene_manual").to_string(),
    ];
    let current = config.settings.highlight.scene_count;
    let default_index = usize::from(matches!(current, SceneCountMode::Manual(_)));

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.highlight.opt_scenes"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let mode = match selection {
        None => return Ok(()),
        Some(0) => SceneCountMode::Auto,
        Some(_) => {
            let default_count = match current {
                SceneCountMode::Manual(n) => n,
                SceneCountMode::Auto => 5,
            };
            let count: u32 = Input::new()
                .with_prompt(format!(
                    "{} ({MIN_MANUAL_SCENES}-{MAX_MANUAL_SCENES})",
                    t!("settings.highlight.opt_scenes")
                ))
                .default(default_count)
                .validate_with(|n: &u32| -> Result<(), String> {
                    SceneCountMode::manual(*n)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()?;
            SceneCountMode::manual(count)?
        }
    };

    if mode != current {
        config.settings.highlight.scene_count = mode;
        save_settings(&config.settings)?;
        announce_saved(mode);
    }

    Ok(())
}

fn edit_style(term: &Term, config: &mut Config) -> Result<()> {
    let items: Vec<&str> = HighlightStyle::ALL.iter().map(|s| s.label()).collect();
    let default_index = HighlightStyle::ALL
        .iter()
        .position(|&s| s == config.settings.highlight.style)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.highlight.opt_style"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected = HighlightStyle::ALL[selection];
    if selected != config.settings.highlight.style {
        config.settings.highlight.style = selected;
        save_settings(&config.settings)?;
        announce_saved(selected.label());
    }

    Ok(())
}

/// 外部偵測程式設定
fn show_detector_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.detector.title")).cyan().bold());
    println!(
        "\n{} {}",
        style(t!("settings.detector.current")).dim(),
        config
            .settings
            .detector
            .command
            .as_deref()
            .unwrap_or("scdet")
    );
    println!("{}", style(t!("settings.detector.empty_hint")).dim());
    println!();

    let command: String = Input::new()
        .with_prompt(t!("settings.detector.command_prompt"))
        .default(config.settings.detector.command.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let mut detector = config.settings.detector.clone();
    let command = command.trim();
    detector.command = (!command.is_empty()).then(|| command.to_string());

    if detector.command.is_some() {
        let args: String = Input::new()
            .with_prompt(t!("settings.detector.args_prompt"))
            .default(detector.args.join(" "))
            .allow_empty(true)
            .interact_text()?;
        detector.args = args.split_whitespace().map(str::to_string).collect();

        detector.timeout_secs = Input::new()
            .with_prompt(t!("settings.detector.timeout_prompt"))
            .default(detector.timeout_secs)
            .validate_with(|n: &u64| -> Result<(), String> {
                if *n == 0 {
                    Err(t!("settings.detector.timeout_invalid").to_string())
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        detector.fallback_to_scene_detection = Confirm::new()
            .with_prompt(t!("settings.detector.fallback_prompt"))
            .default(detector.fallback_to_scene_detection)
            .interact()?;
    }

    if detector != config.settings.detector {
        config.settings.detector = detector;
        save_settings(&config.settings)?;
        announce_saved(config.settings.detector.command.as_deref().unwrap_or("scdet"));
    }

    Ok(())
}

/// 輸出與媒體庫資料夾
fn show_directory_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.directories.title")).cyan().bold());
    println!("{}", style(t!("settings.directories.empty_hint")).dim());
    println!();

    let output: String = Input::new()
        .with_prompt(t!("settings.directories.output_prompt"))
        .default(config.settings.output_directory.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    let library: String = Input::new()
        .with_prompt(t!("settings.directories.library_prompt"))
        .default(config.settings.library_directory.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let as_setting = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };
    let output = as_setting(&output);
    let library = as_setting(&library);

    if output != config.settings.output_directory || library != config.settings.library_directory
    {
        config.settings.output_directory = output;
        config.settings.library_directory = library;
        save_settings(&config.settings)?;
        announce_saved(config.settings.output_directory.as_deref().unwrap_or("-"));
    }

    Ok(())
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let languages = [Language::EnUs, Language::ZhTw];

    let items: Vec<String> = languages.iter().map(|l: &Language| l.to_string()).collect();

    let default_index = languages
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected_lang = languages[selection];

    if selected_lang != config.settings.language {
        config.settings.language = selected_lang;
        rust_i18n::set_locale(selected_lang.as_str());
        save_settings(&config.settings)?;
        announce_saved(selected_lang);
    }

    Ok(())
}
