use gtk::prelude::*;
use relm4::prelude::*;

use crate::config;
use crate::models::{FileRef, Message, Role};

pub struct MessageWidget {
    pub message: Message,
    content_box: gtk::Box,
    bubble: gtk::Box,
}

#[derive(Debug)]
pub enum MessageWidgetOutput {
    OpenFile(FileRef),
    OpenUri(String),
}

#[relm4::factory(pub)]
impl FactoryComponent for MessageWidget {
    type Init = Message;
    type Input = ();
    type Output = MessageWidgetOutput;
    type CommandOutput = ();
    type ParentWidget = gtk::Box;

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Vertical,
            set_spacing: 0,
        }
    }

    fn init_model(message: Self::Init, _index: &DynamicIndex, _sender: FactorySender<Self>) -> Self {
        let content_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(6)
            .margin_start(8)
            .margin_end(8)
            .margin_top(8)
            .margin_bottom(8)
            .build();

        let bubble = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(4)
            .hexpand(true)
            .build();

        Self {
            message,
            content_box,
            bubble,
        }
    }

    fn init_widgets(
        &mut self,
        _index: &DynamicIndex,
        root: Self::Root,
        _returned_widget: &<Self::ParentWidget as relm4::factory::FactoryView>::ReturnedWidget,
        sender: FactorySender<Self>,
    ) -> Self::Widgets {
        let is_user = self.message.role == Role::User;

        if is_user {
            self.bubble.add_css_class("message-bubble-user");
        } else {
            self.bubble.add_css_class("message-bubble-assistant");
        }
        self.bubble.add_css_class("card");

        // Role label + timestamp
        let role_time_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .margin_start(8)
            .margin_end(8)
            .margin_top(4)
            .build();

        let role_label = gtk::Label::builder()
            .label(match self.message.role {
                Role::User => "Anda",
                Role::Assistant => config::APP_NAME,
            })
            .halign(gtk::Align::Start)
            .hexpand(true)
            .build();
        role_label.add_css_class("caption");
        role_label.add_css_class("dim-label");
        role_time_box.append(&role_label);

        let time_label = gtk::Label::builder()
            .label(
                self.message
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M")
                    .to_string(),
            )
            .halign(gtk::Align::End)
            .build();
        time_label.add_css_class("caption");
        time_label.add_css_class("dim-label");
        time_label.add_css_class("message-timestamp");
        role_time_box.append(&time_label);

        self.bubble.append(&role_time_box);

        let label = gtk::Label::builder()
            .label(&self.message.content)
            .halign(gtk::Align::Start)
            .xalign(0.0)
            .wrap(true)
            .wrap_mode(gtk::pango::WrapMode::WordChar)
            .selectable(true)
            .build();
        self.content_box.append(&label);

        if !self.message.files.is_empty() {
            let file_list = build_file_list(
                &self.message.files,
                self.message.folder_url.as_deref(),
                &sender,
            );
            self.content_box.append(&file_list);
        }

        self.bubble.append(&self.content_box);

        let message_row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .margin_top(4)
            .margin_bottom(4)
            .margin_start(if is_user { 96 } else { 12 })
            .margin_end(if is_user { 12 } else { 96 })
            .halign(if is_user {
                gtk::Align::End
            } else {
                gtk::Align::Start
            })
            .build();
        message_row.append(&self.bubble);
        root.append(&message_row);

        let widgets = view_output!();
        widgets
    }
}

/// One button per referenced document, then the folder link when the reply
/// carried one.
fn build_file_list(
    files: &[FileRef],
    folder_url: Option<&str>,
    sender: &FactorySender<MessageWidget>,
) -> gtk::Widget {
    let list = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(4)
        .margin_top(4)
        .build();
    list.add_css_class("file-list");

    for file in files {
        let row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .build();

        let icon = gtk::Image::from_icon_name("x-office-document-symbolic");
        icon.set_pixel_size(24);
        row.append(&icon);

        let text_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(0)
            .hexpand(true)
            .build();
        let name_label = gtk::Label::builder()
            .label(&file.filename)
            .halign(gtk::Align::Start)
            .ellipsize(gtk::pango::EllipsizeMode::Middle)
            .build();
        name_label.add_css_class("heading");
        text_box.append(&name_label);

        let hint_label = gtk::Label::builder()
            .label("Klik untuk preview & download")
            .halign(gtk::Align::Start)
            .build();
        hint_label.add_css_class("caption");
        hint_label.add_css_class("dim-label");
        text_box.append(&hint_label);
        row.append(&text_box);

        let button = gtk::Button::builder().child(&row).build();
        button.add_css_class("file-button");
        let sender_file = sender.output_sender().clone();
        let file = file.clone();
        button.connect_clicked(move |_| {
            let _ = sender_file.send(MessageWidgetOutput::OpenFile(file.clone()));
        });
        list.append(&button);
    }

    if let Some(url) = folder_url {
        let folder_button = gtk::Button::builder()
            .label("Lihat Folder Google Drive")
            .tooltip_text(url)
            .halign(gtk::Align::Start)
            .build();
        folder_button.add_css_class("flat");
        folder_button.add_css_class("folder-link");
        let sender_folder = sender.output_sender().clone();
        let url = url.to_string();
        folder_button.connect_clicked(move |_| {
            let _ = sender_folder.send(MessageWidgetOutput::OpenUri(url.clone()));
        });
        list.append(&folder_button);
    }

    list.upcast()
}
