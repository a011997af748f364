use adw::prelude::*;

use crate::config;

pub fn create_about_dialog(parent: &adw::ApplicationWindow) {
    let about = adw::AboutWindow::builder()
        .application_name(config::APP_NAME)
        .version(config::VERSION)
        .developer_name("NLP Hukum Contributors")
        .license_type(gtk::License::Gpl30)
        .comments("Asisten pencarian dokumen hukum Indonesia")
        .application_icon(config::APP_ID)
        .build();
    about.set_transient_for(Some(parent));
    about.present();
}

pub fn create_shortcuts_window(parent: &adw::ApplicationWindow) {
    let window = gtk::ShortcutsWindow::builder()
        .transient_for(parent)
        .modal(true)
        .build();

    let general_group = gtk::ShortcutsGroup::builder().title("Umum").build();
    for (title, accel) in [
        ("Chat baru", "<Control>n"),
        ("Pintasan keyboard", "<Control>slash"),
    ] {
        let shortcut = gtk::ShortcutsShortcut::builder()
            .title(title)
            .accelerator(accel)
            .build();
        general_group.add_shortcut(&shortcut);
    }

    let chat_group = gtk::ShortcutsGroup::builder().title("Chat").build();
    for (title, accel) in [
        ("Kirim pesan", "Return"),
        ("Baris baru", "<Shift>Return"),
        ("Tutup preview dokumen", "Escape"),
    ] {
        let shortcut = gtk::ShortcutsShortcut::builder()
            .title(title)
            .accelerator(accel)
            .build();
        chat_group.add_shortcut(&shortcut);
    }

    let section = gtk::ShortcutsSection::builder()
        .title(config::APP_NAME)
        .build();
    section.add_group(&general_group);
    section.add_group(&chat_group);

    window.add_section(&section);
    window.present();
}
